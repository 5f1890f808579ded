use std::time::Instant;

/// Upper bound on a single frame step, in seconds.
pub const MAX_FRAME_DELTA: f32 = 1.0 / 20.0;

/// Clamp a raw frame delta to `[0, MAX_FRAME_DELTA]`; non-finite deltas become zero.
pub fn clamp_delta(delta: f32) -> f32 {
    if delta.is_finite() {
        delta.clamp(0.0, MAX_FRAME_DELTA)
    } else {
        0.0
    }
}

/// Frame clock - tracks wall-clock delta between ticks
///
/// Deltas are clamped so a stalled or backgrounded window resumes with a
/// bounded animation step.
#[derive(Debug)]
pub struct Clock {
    last_tick: Instant,
}

impl Clock {
    /// Create new clock starting now
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    /// Clamped delta since last tick in seconds; advances the clock
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        clamp_delta(delta)
    }

    /// Reset clock to current time
    pub fn reset(&mut self) {
        self.last_tick = Instant::now();
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn clock_measures_delta() {
        let mut clock = Clock::new();

        thread::sleep(Duration::from_millis(10));
        let delta = clock.tick();

        assert!(delta >= 0.009 && delta <= MAX_FRAME_DELTA);
    }

    #[test]
    fn clock_clamps_long_stalls() {
        let mut clock = Clock::new();

        thread::sleep(Duration::from_millis(80));
        assert_eq!(clock.tick(), MAX_FRAME_DELTA);
    }

    #[test]
    fn clock_resets() {
        let mut clock = Clock::new();

        thread::sleep(Duration::from_millis(10));
        clock.reset();

        let delta = clock.tick();
        assert!(delta < 0.005);
    }

    #[test]
    fn clamp_delta_bounds() {
        assert_eq!(clamp_delta(0.01), 0.01);
        assert_eq!(clamp_delta(1.0), MAX_FRAME_DELTA);
        assert_eq!(clamp_delta(-0.5), 0.0);
        assert_eq!(clamp_delta(f32::NAN), 0.0);
        assert_eq!(clamp_delta(f32::INFINITY), 0.0);
    }
}
