//! Renders the active logical scene through the post-processing chain.

use crate::compositor::Postprocessing;
use crate::core::{FrameInfo, StageContext, Viewport};
use crate::error::{PipelineError, Result};
use crate::render::RenderBackend;
use crate::scene::LogicalScene;

pub struct SceneRenderer {
    scenes: Vec<LogicalScene>,
    active: usize,
    post: Postprocessing,
}

impl SceneRenderer {
    pub fn new(post: Postprocessing, scene: LogicalScene) -> Self {
        Self {
            scenes: vec![scene],
            active: 0,
            post,
        }
    }

    pub fn add_scene(&mut self, scene: LogicalScene) {
        self.scenes.push(scene);
    }

    /// Make the named scene active
    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let index = self
            .scenes
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| PipelineError::InvalidConfig {
                pass: "scene renderer".to_string(),
                reason: format!("no scene named `{}`", name),
            })?;
        if index != self.active {
            log::info!("Active scene: {}", name);
            self.active = index;
        }
        Ok(())
    }

    pub fn active(&self) -> &LogicalScene {
        &self.scenes[self.active]
    }

    pub fn active_mut(&mut self) -> &mut LogicalScene {
        &mut self.scenes[self.active]
    }

    pub fn scenes(&self) -> &[LogicalScene] {
        &self.scenes
    }

    pub fn post(&self) -> &Postprocessing {
        &self.post
    }

    pub fn post_mut(&mut self) -> &mut Postprocessing {
        &mut self.post
    }

    /// Propagate a viewport change to cameras and every viewport-sized target
    pub fn resize(&mut self, backend: &mut dyn RenderBackend, viewport: &Viewport) -> Result<()> {
        for scene in &mut self.scenes {
            scene.camera.set_aspect(viewport.aspect());
        }
        let (width, height) = viewport.drawing_size();
        self.post.resize(backend, width, height)
    }

    /// Step the active scene and every pass
    pub fn update(&mut self, frame: &FrameInfo, ctx: &StageContext) {
        self.scenes[self.active].scene.update(frame, ctx);
        self.post.update(frame, ctx);
    }

    /// Draw the active scene, directly or through the enabled passes
    ///
    /// Targets that missed a resize are brought up to the viewport size first.
    pub fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        viewport: &Viewport,
        frame: &FrameInfo,
    ) -> Result<()> {
        let (width, height) = viewport.drawing_size();
        if self.post.ensure_size(backend, width, height)? {
            for scene in &mut self.scenes {
                scene.camera.set_aspect(viewport.aspect());
            }
        }
        let scene = &self.scenes[self.active];
        self.post.render(backend, scene, frame)
    }

    pub fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        self.post.dispose(backend);
    }
}

impl std::fmt::Debug for SceneRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRenderer")
            .field("active", &self.active().name())
            .field("scenes", &self.scenes.len())
            .field("post", &self.post)
            .finish()
    }
}
