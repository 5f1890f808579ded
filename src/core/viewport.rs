/// Viewport - CSS-pixel dimensions plus device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in logical pixels
    pub width: u32,
    /// Height in logical pixels
    pub height: u32,
    /// Physical pixels per logical pixel
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_pixel_ratio(width, height, 1.0)
    }

    pub fn with_pixel_ratio(width: u32, height: u32, pixel_ratio: f32) -> Self {
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Size of the drawing buffer in physical pixels, never zero
    pub fn drawing_size(&self) -> (u32, u32) {
        let w = (self.width as f32 * self.pixel_ratio).round() as u32;
        let h = (self.height as f32 * self.pixel_ratio).round() as u32;
        (w.max(1), h.max(1))
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Height as used by section offsets; at least one pixel
    pub fn scroll_height(&self) -> f32 {
        self.height.max(1) as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
