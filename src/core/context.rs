use super::frame::FrameInfo;
use super::input::InputState;
use super::viewport::Viewport;

/// Shared per-stage state, constructed once and passed by reference
///
/// Holds what would otherwise be process-wide globals: viewport, time and input.
#[derive(Debug, Clone, Default)]
pub struct StageContext {
    pub viewport: Viewport,
    pub time: FrameInfo,
    pub input: InputState,
}

impl StageContext {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            time: FrameInfo::default(),
            input: InputState::new(),
        }
    }
}
