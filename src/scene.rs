use glam::Mat4;

use crate::camera::Camera;
use crate::core::{FrameInfo, StageContext};

/// One drawable in a scene: a unit cube under `transform`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub transform: Mat4,
    pub color: [f32; 4],
}

impl SceneObject {
    pub fn new(transform: Mat4, color: [f32; 4]) -> Self {
        Self { transform, color }
    }
}

/// Scene content the pipeline renders without inspecting
pub trait Scene {
    /// Scene name for logging and command traces
    fn name(&self) -> &str;

    fn objects(&self) -> &[SceneObject];

    /// Per-frame update hook
    fn update(&mut self, _frame: &FrameInfo, _ctx: &StageContext) {}
}

/// Capability contract: a scene plus the camera that views it
pub trait SceneProvider {
    fn scene(&self) -> &dyn Scene;
    fn camera(&self) -> &Camera;
}

/// Owned scene + camera pair
pub struct LogicalScene {
    pub scene: Box<dyn Scene>,
    pub camera: Camera,
}

impl LogicalScene {
    pub fn new(scene: Box<dyn Scene>, camera: Camera) -> Self {
        Self { scene, camera }
    }

    pub fn name(&self) -> &str {
        self.scene.name()
    }
}

impl SceneProvider for LogicalScene {
    fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }
}

impl std::fmt::Debug for LogicalScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicalScene")
            .field("scene", &self.scene.name())
            .field("camera", &self.camera)
            .finish()
    }
}

/// Fixed list of objects; handy for tests and static backdrops
#[derive(Debug, Clone)]
pub struct StaticScene {
    name: String,
    objects: Vec<SceneObject>,
}

impl StaticScene {
    pub fn new(name: impl Into<String>, objects: Vec<SceneObject>) -> Self {
        Self {
            name: name.into(),
            objects,
        }
    }
}

impl Scene for StaticScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn objects(&self) -> &[SceneObject] {
        &self.objects
    }
}
