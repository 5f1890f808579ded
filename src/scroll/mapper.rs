use serde::{Deserialize, Serialize};

use super::keyframes::{KeyframeId, KeyframeSet};
use super::region::{ScrollRegion, SectionId, SectionProbe};
use crate::camera::{Camera, CameraPose};
use crate::core::Countdown;
use crate::math::{remap_clamped, Easing};

/// Which section offset drives a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetKind {
    /// `(viewport_height - top) / viewport_height`
    Show,
    /// `-bottom / viewport_height`
    Hide,
}

/// Blend between two keyframes driven by one section's offset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTransition {
    pub section: SectionId,
    pub from: KeyframeId,
    pub to: KeyframeId,
    pub offset: OffsetKind,
    /// Offset values mapped to progress 0 and 1
    pub range: (f32, f32),
    #[serde(default)]
    pub easing: Easing,
}

impl CameraTransition {
    /// Eased progress in `[0, 1]`
    pub fn progress(&self, region: &ScrollRegion, viewport_height: f32) -> f32 {
        let offset = match self.offset {
            OffsetKind::Show => region.show_offset(viewport_height),
            OffsetKind::Hide => region.hide_offset(viewport_height),
        };
        self.easing
            .apply(remap_clamped(offset, self.range.0, self.range.1, 0.0, 1.0))
    }

    pub fn pose(&self, keyframes: &KeyframeSet, region: &ScrollRegion, viewport_height: f32) -> CameraPose {
        let t = self.progress(region, viewport_height);
        keyframes.get(self.from).lerp(&keyframes.get(self.to), t)
    }
}

/// Tuned thresholds for the default page
pub fn default_transitions() -> Vec<CameraTransition> {
    let transition = |section, from, to, offset, range| CameraTransition {
        section,
        from,
        to,
        offset,
        range,
        easing: Easing::InOutQuad,
    };
    vec![
        transition(
            SectionId::Home,
            KeyframeId::Home,
            KeyframeId::Projects,
            OffsetKind::Hide,
            (-0.6, 0.0),
        ),
        transition(
            SectionId::Projects,
            KeyframeId::Projects,
            KeyframeId::AboutIntro,
            OffsetKind::Hide,
            (-0.5, 0.0),
        ),
        transition(
            SectionId::AboutIntro,
            KeyframeId::AboutIntro,
            KeyframeId::AboutContent,
            OffsetKind::Hide,
            (-0.8, 0.0),
        ),
        transition(
            SectionId::AboutContent,
            KeyframeId::AboutContent,
            KeyframeId::Contact,
            OffsetKind::Hide,
            (-0.6, 0.0),
        ),
        transition(
            SectionId::Contact,
            KeyframeId::AboutContent,
            KeyframeId::Contact,
            OffsetKind::Show,
            (0.5, 1.0),
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Root,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub enabled: bool,
    /// Seconds from the intro pose to the home pose
    pub duration: f32,
    pub easing: Easing,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: 2.5,
            easing: Easing::InOutCubic,
        }
    }
}

/// Drives the camera from section geometry
///
/// On the root route the camera is pinned to the intro pose until the
/// time-based intro finishes; after that the first active section in
/// priority order picks the blend. With no active section the last pose is
/// held.
#[derive(Debug, Clone)]
pub struct ScrollCameraMapper {
    keyframes: KeyframeSet,
    /// Stably sorted by section priority
    transitions: Vec<CameraTransition>,
    intro: IntroConfig,
    countdown: Countdown,
    intro_done: bool,
    route: Option<Route>,
    pose: CameraPose,
    active: Option<SectionId>,
}

impl Default for ScrollCameraMapper {
    fn default() -> Self {
        Self::new(KeyframeSet::default(), default_transitions(), IntroConfig::default())
    }
}

impl ScrollCameraMapper {
    pub fn new(keyframes: KeyframeSet, mut transitions: Vec<CameraTransition>, intro: IntroConfig) -> Self {
        transitions.sort_by_key(|t| t.section);
        Self {
            pose: keyframes.get(KeyframeId::Intro),
            keyframes,
            transitions,
            countdown: Countdown::new(intro.duration),
            intro_done: !intro.enabled,
            intro,
            route: None,
            active: None,
        }
    }

    /// Change route and re-resolve section anchors
    ///
    /// Entering the root route before the intro has finished pins the intro
    /// pose and starts the intro animation. The latch never resets.
    pub fn enter_route(&mut self, route: Route, probe: &mut dyn SectionProbe) {
        probe.resolve();
        self.route = Some(route);
        if route == Route::Root && !self.intro_done {
            self.pose = self.keyframes.get(KeyframeId::Intro);
            self.countdown.start();
            log::info!("Intro started ({:.1}s)", self.intro.duration);
        }
    }

    /// Mark the intro finished without playing it
    pub fn skip_intro(&mut self) {
        if !self.intro_done {
            self.intro_done = true;
            self.pose = self.keyframes.get(KeyframeId::Home);
        }
    }

    pub fn intro_complete(&self) -> bool {
        self.intro_done
    }

    pub fn intro_progress(&self) -> f32 {
        if self.intro_done {
            1.0
        } else {
            self.countdown.progress()
        }
    }

    pub fn route(&self) -> Option<Route> {
        self.route
    }

    /// Last computed pose
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    /// Section whose blend produced the current pose
    pub fn active_section(&self) -> Option<SectionId> {
        self.active
    }

    pub fn keyframes(&self) -> &KeyframeSet {
        &self.keyframes
    }

    pub fn transitions(&self) -> &[CameraTransition] {
        &self.transitions
    }

    /// Advance one tick and write the pose into `camera`
    pub fn update(
        &mut self,
        delta: f32,
        viewport_height: f32,
        probe: &dyn SectionProbe,
        camera: &mut Camera,
    ) -> Option<SectionId> {
        if self.route == Some(Route::Root) && !self.intro_done {
            self.step_intro(delta);
            self.active = None;
        } else {
            self.active = self.resolve(probe, viewport_height);
        }
        camera.pose = self.pose;
        self.active
    }

    fn step_intro(&mut self, delta: f32) {
        let finished = self.countdown.tick(delta);
        let t = self.intro.easing.apply(self.countdown.progress());
        self.pose = self
            .keyframes
            .get(KeyframeId::Intro)
            .lerp(&self.keyframes.get(KeyframeId::Home), t);
        if finished {
            self.intro_done = true;
            log::info!("Intro complete; scroll control enabled");
        }
    }

    /// Pick the first active section in priority order and apply its blend
    ///
    /// An active section without a transition still claims priority and
    /// holds the pose.
    pub fn resolve(&mut self, probe: &dyn SectionProbe, viewport_height: f32) -> Option<SectionId> {
        for section in SectionId::PRIORITY {
            let Some(region) = probe.measure(section) else {
                continue;
            };
            if !region.is_active(viewport_height) {
                continue;
            }
            if let Some(transition) = self.transitions.iter().find(|t| t.section == section) {
                self.pose = transition.pose(&self.keyframes, &region, viewport_height);
            }
            return Some(section);
        }
        None
    }
}
