/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    /// Seconds since the driver started, summed from clamped deltas
    pub time: f32,
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }

    /// Next frame after stepping by `delta`
    pub fn advance(&self, delta: f32) -> Self {
        Self {
            number: self.number + 1,
            time: self.time + delta,
            delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let frame = FrameInfo::default().advance(0.016).advance(0.02);
        assert_eq!(frame.number, 2);
        assert!((frame.time - 0.036).abs() < 1e-6);
        assert_eq!(frame.delta, 0.02);
    }
}
