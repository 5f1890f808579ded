use serde::{Deserialize, Serialize};

use crate::core::{InputState, Viewport};

/// Page sections, declared in resolution priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Home,
    Projects,
    AboutIntro,
    AboutContent,
    Contact,
}

impl SectionId {
    /// Earlier entries win when several windows are active
    pub const PRIORITY: [SectionId; 5] = [
        SectionId::Home,
        SectionId::Projects,
        SectionId::AboutIntro,
        SectionId::AboutContent,
        SectionId::Contact,
    ];

    /// Stable anchor identifier of the section
    pub fn anchor(&self) -> &'static str {
        match self {
            SectionId::Home => "home",
            SectionId::Projects => "projects",
            SectionId::AboutIntro => "about-intro",
            SectionId::AboutContent => "about-content",
            SectionId::Contact => "contact",
        }
    }
}

/// Viewport-relative vertical extent of a section, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRegion {
    pub top: f32,
    pub bottom: f32,
}

impl ScrollRegion {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }

    /// How far the section has entered from the bottom edge
    pub fn show_offset(&self, viewport_height: f32) -> f32 {
        if viewport_height > 0.0 {
            (viewport_height - self.top) / viewport_height
        } else {
            0.0
        }
    }

    /// How far the section has left past the top edge; reaches 0 as its
    /// bottom crosses the top of the viewport
    pub fn hide_offset(&self, viewport_height: f32) -> f32 {
        if viewport_height > 0.0 {
            -self.bottom / viewport_height
        } else {
            0.0
        }
    }

    /// Any part of the section is on screen
    pub fn is_active(&self, viewport_height: f32) -> bool {
        self.top <= viewport_height && self.bottom >= 0.0
    }
}

/// Source of section geometry
pub trait SectionProbe {
    /// Current region of a section, `None` while its anchor is missing
    fn measure(&self, section: SectionId) -> Option<ScrollRegion>;

    /// Re-attach anchors, e.g. after a route change mounted new content
    fn resolve(&mut self) {}

    /// Per-tick hook for probes that consume input themselves
    fn sync(&mut self, _delta: f32, _input: &InputState, _viewport: &Viewport) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        let vh = 1000.0;
        // section just entering from the bottom
        let entering = ScrollRegion::new(1000.0, 2000.0);
        assert_eq!(entering.show_offset(vh), 0.0);
        assert!(entering.is_active(vh));

        // section filling the viewport
        let full = ScrollRegion::new(0.0, 1000.0);
        assert_eq!(full.show_offset(vh), 1.0);
        assert_eq!(full.hide_offset(vh), -1.0);

        // bottom edge at the top of the viewport
        let leaving = ScrollRegion::new(-1000.0, 0.0);
        assert_eq!(leaving.hide_offset(vh), 0.0);
        assert!(leaving.is_active(vh));
        assert!(!ScrollRegion::new(-1000.0, -1.0).is_active(vh));
    }

    #[test]
    fn test_zero_height_viewport_is_finite() {
        let region = ScrollRegion::new(10.0, 20.0);
        assert_eq!(region.show_offset(0.0), 0.0);
        assert_eq!(region.hide_offset(0.0), 0.0);
    }

    #[test]
    fn test_priority_matches_declaration_order() {
        let mut sorted = SectionId::PRIORITY;
        sorted.sort();
        assert_eq!(sorted, SectionId::PRIORITY);
    }
}
