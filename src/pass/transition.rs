use std::any::Any;
use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::copy::not_initialised;
use super::{FullscreenMaterial, Pass, PassContext, PassIo, PassState};
use crate::camera::{Camera, CameraMatrices};
use crate::core::{FrameInfo, StageContext, Viewport};
use crate::error::{PipelineError, Result};
use crate::math::{saturate, Plane};
use crate::render::{
    Destination, FilterMode, PixelFormat, ProgramDesc, RenderBackend, RendererState, Rgba,
    TargetDesc, TargetId, WrapMode, INPUT_TEXTURE,
};
use crate::scene::LogicalScene;

const TRANSITION_SHADER: &str = include_str!("shaders/transition.wgsl");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionPassConfig {
    pub name: String,
    pub enabled: bool,
    pub render_order: i32,
    /// Fixed blend amount; `None` cycles with time at `speed` Hz
    pub progress: Option<f32>,
    pub speed: f32,
    /// Clear colour of the second scene's private target
    pub clear_color: Rgba,
    /// 1 or 4
    pub samples: u32,
    /// Sampling of the second scene's image
    pub filter: FilterMode,
    pub wrap: WrapMode,
    /// Show the second scene mirrored in the horizontal plane at this height
    pub mirror_height: Option<f32>,
}

impl Default for TransitionPassConfig {
    fn default() -> Self {
        Self {
            name: "transition".to_string(),
            enabled: true,
            render_order: 0,
            progress: None,
            speed: 0.25,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            samples: 1,
            filter: FilterMode::Linear,
            wrap: WrapMode::ClampToEdge,
            mirror_height: None,
        }
    }
}

/// Blends the chain's image toward a second scene rendered every invocation
///
/// The nested scene render happens outside the normal pass sequencing, so the
/// backend's destination, clear colour and auto-clear are restored afterwards.
#[derive(Debug)]
pub struct TransitionPass {
    config: TransitionPassConfig,
    state: PassState,
    scene: Option<LogicalScene>,
    target: Option<TargetId>,
    material: Option<FullscreenMaterial>,
    progress: f32,
}

impl TransitionPass {
    pub fn new(config: TransitionPassConfig) -> Result<Self> {
        if let Some(progress) = config.progress {
            if !progress.is_finite() {
                return Err(PipelineError::InvalidConfig {
                    pass: config.name.clone(),
                    reason: "progress is not finite".to_string(),
                });
            }
        }
        if !config.speed.is_finite() || config.speed < 0.0 {
            return Err(PipelineError::InvalidConfig {
                pass: config.name.clone(),
                reason: format!("speed {} must be finite and non-negative", config.speed),
            });
        }
        if !matches!(config.samples, 1 | 4) {
            return Err(PipelineError::InvalidConfig {
                pass: config.name.clone(),
                reason: format!("samples must be 1 or 4, got {}", config.samples),
            });
        }
        if config.mirror_height.is_some_and(|h| !h.is_finite()) {
            return Err(PipelineError::InvalidConfig {
                pass: config.name.clone(),
                reason: "mirror height is not finite".to_string(),
            });
        }
        Ok(Self {
            state: PassState {
                enabled: config.enabled,
                render_order: config.render_order,
                override_input: false,
            },
            progress: config.progress.map(saturate).unwrap_or(0.0),
            config,
            scene: None,
            target: None,
            material: None,
        })
    }

    pub fn with_scene(mut self, scene: LogicalScene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Replace the second scene; `None` turns the pass into a pass-through
    pub fn set_scene(&mut self, scene: Option<LogicalScene>) -> Option<LogicalScene> {
        std::mem::replace(&mut self.scene, scene)
    }

    pub fn scene(&self) -> Option<&LogicalScene> {
        self.scene.as_ref()
    }

    /// Pin the blend amount, or hand it back to the clock with `None`
    pub fn set_progress(&mut self, progress: Option<f32>) {
        self.config.progress = progress.map(saturate);
        if let Some(p) = self.config.progress {
            self.progress = p;
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Private target the second scene renders into
    pub fn scene_target(&self) -> Option<TargetId> {
        self.target
    }

    /// Floor the second scene is reflected in, if mirrored
    pub fn mirror_plane(&self) -> Option<Plane> {
        self.config
            .mirror_height
            .map(|h| Plane::from_point_normal(Vec3::new(0.0, h, 0.0), Vec3::Y))
    }

    fn capture_matrices(&self, camera: &Camera) -> CameraMatrices {
        match self.mirror_plane() {
            Some(plane) => camera.reflected(&plane),
            None => camera.matrices(),
        }
    }

    fn target_desc(&self, width: u32, height: u32) -> TargetDesc {
        let label = format!("{} scene", self.config.name);
        let desc = TargetDesc::new(label, width, height, self.config.samples)
            .with_filter(self.config.filter)
            .with_wrap(self.config.wrap)
            .with_depth();
        match self.config.mirror_height {
            Some(_) => desc.with_format(PixelFormat::Rgba16Float),
            None => desc,
        }
    }
}

impl Pass for TransitionPass {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, viewport: &Viewport) -> Result<()> {
        let desc = ProgramDesc::new(self.config.name.clone(), TRANSITION_SHADER).require(INPUT_TEXTURE);
        let program = backend.create_program(desc)?;

        // Allocation may rebind the destination.
        let saved = RendererState::capture(backend);
        let (width, height) = viewport.drawing_size();
        self.target = Some(backend.create_target(&self.target_desc(width, height)));
        saved.restore(backend);

        if let Some(scene) = self.scene.as_mut() {
            scene.camera.set_aspect(viewport.aspect());
        }
        self.material = Some(FullscreenMaterial::new(program));
        Ok(())
    }

    fn resize(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<()> {
        if let Some(target) = self.target {
            backend.resize_target(target, width, height)?;
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.camera.set_aspect(width as f32 / height.max(1) as f32);
        }
        Ok(())
    }

    fn update(&mut self, frame: &FrameInfo, ctx: &StageContext) {
        self.progress = match self.config.progress {
            Some(progress) => progress,
            None => 0.5 - 0.5 * (frame.time * self.config.speed * TAU).cos(),
        };
        if let Some(scene) = self.scene.as_mut() {
            scene.scene.update(frame, ctx);
        }
    }

    fn render(&mut self, ctx: &mut PassContext<'_>, io: PassIo, _camera: &Camera) -> Result<()> {
        let matrices = self.scene.as_ref().map(|s| self.capture_matrices(&s.camera));
        let material = self
            .material
            .as_mut()
            .ok_or_else(|| not_initialised(&self.config.name))?;

        match (self.scene.as_ref(), matrices, self.target) {
            (Some(scene), Some(matrices), Some(target)) => {
                let saved = RendererState::capture(ctx.backend);
                ctx.backend.set_render_target(Destination::Target(target));
                ctx.backend.set_clear_color(self.config.clear_color);
                ctx.backend.set_auto_clear(true);
                let rendered = ctx.backend.render_scene(scene.scene.as_ref(), &matrices);
                saved.restore(ctx.backend);
                rendered?;

                material.aux = Some(target);
                material.uniforms.progress = self.progress;
            }
            _ => {
                material.aux = None;
                material.uniforms.progress = 0.0;
            }
        }
        material.draw(ctx, io)
    }

    fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(material) = self.material.take() {
            material.dispose(backend);
        }
        if let Some(target) = self.target.take() {
            backend.dispose_target(target);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
