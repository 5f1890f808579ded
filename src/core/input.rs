use glam::Vec2;
use winit::event::{MouseScrollDelta, WindowEvent};

use super::viewport::Viewport;

/// Per-frame cap on the accumulated wheel delta, in pixels
pub const MAX_WHEEL_DELTA: f32 = 150.0;

/// Pixels per wheel "line" for line-based scroll devices
const LINE_HEIGHT: f32 = 40.0;

/// Pointer and wheel state recorded between frame ticks
///
/// Event callbacks only record; the frame driver is the single consumer and
/// calls [`InputState::post_update`] at the end of every tick.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Pointer in NDC, `[-1, 1]` on both axes, +y up
    pointer: Vec2,
    /// Last pointer position in pixels
    pointer_px: Option<Vec2>,
    /// Pixel movement since last post_update
    pointer_delta: Vec2,
    /// Wheel movement since last post_update, clamped
    wheel_delta: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pointer move in window pixels
    pub fn pointer_moved(&mut self, x: f32, y: f32, viewport: &Viewport) {
        let position = Vec2::new(x, y);
        if let Some(previous) = self.pointer_px {
            self.pointer_delta += position - previous;
        }
        self.pointer_px = Some(position);

        let w = viewport.width.max(1) as f32;
        let h = viewport.height.max(1) as f32;
        self.pointer = Vec2::new(
            (x / w * 2.0 - 1.0).clamp(-1.0, 1.0),
            -(y / h * 2.0 - 1.0).clamp(-1.0, 1.0),
        );
    }

    /// Record wheel movement in pixels (positive scrolls the page down)
    pub fn wheel(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.wheel_delta = (self.wheel_delta + delta).clamp(-MAX_WHEEL_DELTA, MAX_WHEEL_DELTA);
    }

    /// Record a winit event
    ///
    /// `viewport` is in the same pixel units winit reports, i.e. the drawing size.
    pub fn process_event(&mut self, event: &WindowEvent, viewport: &Viewport) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_moved(position.x as f32, position.y as f32, viewport);
            }
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, y) => self.wheel(-y * LINE_HEIGHT),
                MouseScrollDelta::PixelDelta(position) => self.wheel(-position.y as f32),
            },
            WindowEvent::CursorLeft { .. } => {
                self.pointer_px = None;
            }
            _ => {}
        }
    }

    /// Clear per-frame accumulators
    pub fn post_update(&mut self) {
        self.pointer_delta = Vec2::ZERO;
        self.wheel_delta = 0.0;
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn pointer_px(&self) -> Option<Vec2> {
        self.pointer_px
    }

    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_delta
    }

    pub fn wheel_delta(&self) -> f32 {
        self.wheel_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_input_is_idle() {
        let input = InputState::new();
        assert_eq!(input.pointer(), Vec2::ZERO);
        assert_eq!(input.pointer_px(), None);
        assert_eq!(input.pointer_delta(), Vec2::ZERO);
        assert_eq!(input.wheel_delta(), 0.0);
    }

    #[test]
    fn test_pointer_ndc() {
        let viewport = Viewport::new(200, 100);
        let mut input = InputState::new();

        input.pointer_moved(0.0, 0.0, &viewport);
        assert_eq!(input.pointer(), Vec2::new(-1.0, 1.0));

        input.pointer_moved(100.0, 50.0, &viewport);
        assert_eq!(input.pointer(), Vec2::new(0.0, 0.0));

        input.pointer_moved(200.0, 100.0, &viewport);
        assert_eq!(input.pointer(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_pointer_delta_accumulates_until_post_update() {
        let viewport = Viewport::new(100, 100);
        let mut input = InputState::new();

        input.pointer_moved(10.0, 10.0, &viewport);
        assert_eq!(input.pointer_delta(), Vec2::ZERO); // first sample has no delta
        input.pointer_moved(15.0, 12.0, &viewport);
        input.pointer_moved(20.0, 20.0, &viewport);
        assert_eq!(input.pointer_delta(), Vec2::new(10.0, 10.0));

        input.post_update();
        assert_eq!(input.pointer_delta(), Vec2::ZERO);
        // position survives
        assert_eq!(input.pointer_px(), Some(Vec2::new(20.0, 20.0)));
    }

    #[test]
    fn test_wheel_is_clamped_and_cleared() {
        let mut input = InputState::new();
        input.wheel(100.0);
        input.wheel(100.0);
        assert_eq!(input.wheel_delta(), MAX_WHEEL_DELTA);

        input.wheel(f32::NAN);
        assert_eq!(input.wheel_delta(), MAX_WHEEL_DELTA);

        input.post_update();
        assert_eq!(input.wheel_delta(), 0.0);

        input.wheel(-400.0);
        assert_eq!(input.wheel_delta(), -MAX_WHEEL_DELTA);
    }
}
