use serde::{Deserialize, Serialize};

use crate::camera::CameraPose;

/// Named camera poses the scroll mapper blends between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyframeId {
    Intro,
    Home,
    Projects,
    AboutIntro,
    AboutContent,
    Contact,
}

impl KeyframeId {
    pub const ALL: [KeyframeId; 6] = [
        KeyframeId::Intro,
        KeyframeId::Home,
        KeyframeId::Projects,
        KeyframeId::AboutIntro,
        KeyframeId::AboutContent,
        KeyframeId::Contact,
    ];

    fn index(&self) -> usize {
        match self {
            KeyframeId::Intro => 0,
            KeyframeId::Home => 1,
            KeyframeId::Projects => 2,
            KeyframeId::AboutIntro => 3,
            KeyframeId::AboutContent => 4,
            KeyframeId::Contact => 5,
        }
    }
}

// Neighbouring rotations stay well inside ±π of each other so component-wise
// Euler blending is valid.
const INTRO: CameraPose = CameraPose::new([0.0, 1.5, 14.0], [0.05, 0.0, 0.0]);
const HOME: CameraPose = CameraPose::new([0.0, 0.6, 8.0], [-0.05, 0.0, 0.0]);
const PROJECTS: CameraPose = CameraPose::new([1.2, 0.2, 5.5], [-0.02, 0.18, 0.0]);
const ABOUT_INTRO: CameraPose = CameraPose::new([0.4, -0.8, 4.5], [0.08, 0.35, 0.02]);
const ABOUT_CONTENT: CameraPose = CameraPose::new([-0.6, -1.6, 5.2], [0.12, 0.2, -0.03]);
const CONTACT: CameraPose = CameraPose::new([0.0, -2.8, 7.0], [0.18, 0.0, 0.0]);

/// Pose table indexed by [`KeyframeId`]
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeSet {
    poses: [CameraPose; 6],
}

impl Default for KeyframeSet {
    fn default() -> Self {
        Self {
            poses: [INTRO, HOME, PROJECTS, ABOUT_INTRO, ABOUT_CONTENT, CONTACT],
        }
    }
}

impl KeyframeSet {
    pub fn get(&self, id: KeyframeId) -> CameraPose {
        self.poses[id.index()]
    }

    pub fn set(&mut self, id: KeyframeId, pose: CameraPose) {
        self.poses[id.index()] = pose;
    }
}
