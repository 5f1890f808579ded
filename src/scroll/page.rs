use serde::{Deserialize, Serialize};

use super::region::{ScrollRegion, SectionId, SectionProbe};
use crate::core::{InputState, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSection {
    pub id: SectionId,
    /// Height in viewport heights
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Top-to-bottom document order
    pub sections: Vec<PageSection>,
    /// Exponential approach rate toward the wheel target, per second;
    /// zero or less jumps immediately
    pub smoothing: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        let section = |id, height| PageSection { id, height };
        Self {
            sections: vec![
                section(SectionId::Home, 1.0),
                section(SectionId::Projects, 2.0),
                section(SectionId::AboutIntro, 1.0),
                section(SectionId::AboutContent, 1.5),
                section(SectionId::Contact, 1.0),
            ],
            smoothing: 8.0,
        }
    }
}

/// Scrollable document of stacked sections
///
/// Stands in for the page layout: wheel input moves a target offset, the
/// visible offset eases toward it, and sections report regions relative to
/// the viewport. Anchors are only measurable after [`SectionProbe::resolve`].
#[derive(Debug, Clone)]
pub struct VirtualPage {
    config: PageConfig,
    viewport_height: f32,
    scroll: f32,
    target: f32,
    resolved: bool,
}

impl VirtualPage {
    pub fn new(config: PageConfig, viewport_height: f32) -> Self {
        let sections = config
            .sections
            .iter()
            .filter(|s| s.height.is_finite() && s.height > 0.0)
            .copied()
            .collect();
        Self {
            config: PageConfig { sections, ..config },
            viewport_height: viewport_height.max(1.0),
            scroll: 0.0,
            target: 0.0,
            resolved: false,
        }
    }

    /// Visible scroll offset in pixels
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn document_height(&self) -> f32 {
        self.config.sections.iter().map(|s| s.height).sum::<f32>() * self.viewport_height
    }

    pub fn max_scroll(&self) -> f32 {
        (self.document_height() - self.viewport_height).max(0.0)
    }

    /// Jump without smoothing
    pub fn scroll_to(&mut self, offset: f32) {
        self.target = offset.clamp(0.0, self.max_scroll());
        self.scroll = self.target;
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        let height = height.max(1.0);
        // keep the same relative position
        let ratio = self.scroll / self.viewport_height;
        let target_ratio = self.target / self.viewport_height;
        self.viewport_height = height;
        self.scroll = (ratio * height).clamp(0.0, self.max_scroll());
        self.target = (target_ratio * height).clamp(0.0, self.max_scroll());
    }

    /// Move toward the target by the elapsed time
    pub fn step(&mut self, delta: f32) {
        if self.config.smoothing <= 0.0 {
            self.scroll = self.target;
            return;
        }
        let blend = 1.0 - (-self.config.smoothing * delta.max(0.0)).exp();
        self.scroll += (self.target - self.scroll) * blend;
        if (self.target - self.scroll).abs() < 0.01 {
            self.scroll = self.target;
        }
    }
}

impl SectionProbe for VirtualPage {
    fn measure(&self, section: SectionId) -> Option<ScrollRegion> {
        if !self.resolved {
            return None;
        }
        let mut offset = 0.0;
        for s in &self.config.sections {
            let height = s.height * self.viewport_height;
            if s.id == section {
                let top = offset - self.scroll;
                return Some(ScrollRegion::new(top, top + height));
            }
            offset += height;
        }
        None
    }

    fn resolve(&mut self) {
        self.resolved = true;
    }

    fn sync(&mut self, delta: f32, input: &InputState, viewport: &Viewport) {
        let height = viewport.scroll_height();
        if height != self.viewport_height {
            self.set_viewport_height(height);
        }
        self.target = (self.target + input.wheel_delta()).clamp(0.0, self.max_scroll());
        self.step(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> VirtualPage {
        let mut page = VirtualPage::new(PageConfig::default(), 1000.0);
        page.resolve();
        page
    }

    #[test]
    fn test_unresolved_page_has_no_anchors() {
        let page = VirtualPage::new(PageConfig::default(), 1000.0);
        assert_eq!(page.measure(SectionId::Home), None);
    }

    #[test]
    fn test_layout() {
        let mut page = page();
        assert_eq!(page.document_height(), 6500.0);
        assert_eq!(page.max_scroll(), 5500.0);
        assert_eq!(page.measure(SectionId::Projects), Some(ScrollRegion::new(1000.0, 3000.0)));

        page.scroll_to(1500.0);
        assert_eq!(page.measure(SectionId::Home), Some(ScrollRegion::new(-1500.0, -500.0)));
        assert_eq!(page.measure(SectionId::Projects), Some(ScrollRegion::new(-500.0, 1500.0)));
    }

    #[test]
    fn test_wheel_is_clamped_to_document() {
        let mut page = page();
        let viewport = Viewport::new(800, 1000);
        let mut input = InputState::new();
        input.wheel(-100.0);
        page.sync(0.016, &input, &viewport);
        assert_eq!(page.target(), 0.0);
        assert_eq!(page.scroll(), 0.0);

        page.scroll_to(5490.0);
        input.post_update();
        input.wheel(100.0);
        page.sync(0.016, &input, &viewport);
        assert_eq!(page.target(), 5500.0);
    }

    #[test]
    fn test_smoothing_converges() {
        let mut page = page();
        let viewport = Viewport::new(800, 1000);
        let mut input = InputState::new();
        input.wheel(120.0);
        page.sync(0.016, &input, &viewport);
        assert!(page.scroll() > 0.0 && page.scroll() < 120.0);

        input.post_update();
        for _ in 0..200 {
            page.sync(0.016, &input, &viewport);
        }
        assert_eq!(page.scroll(), 120.0);
    }

    #[test]
    fn test_viewport_change_keeps_relative_position() {
        let mut page = page();
        page.scroll_to(2000.0);
        page.set_viewport_height(500.0);
        assert_eq!(page.scroll(), 1000.0);
        assert_eq!(page.max_scroll(), 2750.0);
    }
}
