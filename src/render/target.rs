use serde::{Deserialize, Serialize};

/// Stable handle to an offscreen buffer.
///
/// The handle survives resizes: the backend swaps the backing storage but the
/// id keeps addressing the same logical target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

impl TargetId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Where draws land: the default framebuffer or an offscreen target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Destination {
    #[default]
    Screen,
    Target(TargetId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    #[default]
    Rgba8Unorm,
    /// Half-float, for HDR scene and reflection capture
    Rgba16Float,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Linear,
    Nearest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

/// Description of an offscreen buffer's storage.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub format: PixelFormat,
    /// Sampling applied when the target is read by a full-screen pass
    pub filter: FilterMode,
    pub wrap: WrapMode,
    /// Allocate a depth attachment alongside the colour buffer
    pub depth: bool,
}

impl TargetDesc {
    /// Linear-filtered, edge-clamped, 8-bit colour with no depth.
    pub fn new(label: impl Into<String>, width: u32, height: u32, samples: u32) -> Self {
        Self {
            label: label.into(),
            width: width.max(1),
            height: height.max(1),
            samples: samples.max(1),
            format: PixelFormat::default(),
            filter: FilterMode::default(),
            wrap: WrapMode::default(),
            depth: false,
        }
    }

    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn with_depth(mut self) -> Self {
        self.depth = true;
        self
    }

    /// Same description at a new size.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            ..self.clone()
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let desc = TargetDesc::new("scene", 640, 480, 1);
        assert_eq!(desc.size(), (640, 480));
        assert_eq!(desc.format, PixelFormat::Rgba8Unorm);
        assert_eq!(desc.filter, FilterMode::Linear);
        assert_eq!(desc.wrap, WrapMode::ClampToEdge);
        assert!(!desc.depth);
    }

    #[test]
    fn test_zero_sizes_are_bumped() {
        let desc = TargetDesc::new("tiny", 0, 0, 0);
        assert_eq!(desc.size(), (1, 1));
        assert_eq!(desc.samples, 1);
        assert_eq!(desc.resized(0, 5).size(), (1, 5));
    }

    #[test]
    fn test_builders() {
        let desc = TargetDesc::new("reflection", 256, 256, 4)
            .with_format(PixelFormat::Rgba16Float)
            .with_filter(FilterMode::Nearest)
            .with_wrap(WrapMode::Repeat)
            .with_depth();
        assert_eq!(desc.format, PixelFormat::Rgba16Float);
        assert_eq!(desc.filter, FilterMode::Nearest);
        assert_eq!(desc.wrap, WrapMode::Repeat);
        assert_eq!(desc.samples, 4);
        assert!(desc.depth);

        let resized = desc.resized(512, 128);
        assert_eq!(resized.size(), (512, 128));
        assert_eq!(resized.format, PixelFormat::Rgba16Float);
        assert!(resized.depth);
    }
}
