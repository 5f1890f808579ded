use std::any::Any;

use super::{FullscreenMaterial, Pass, PassContext, PassIo, PassState};
use crate::camera::Camera;
use crate::core::Viewport;
use crate::error::{PipelineError, Result};
use crate::render::{ProgramDesc, RenderBackend, INPUT_TEXTURE};

const COPY_SHADER: &str = include_str!("shaders/copy.wgsl");

/// Samples the input and writes it unchanged
#[derive(Debug)]
pub struct CopyPass {
    name: String,
    state: PassState,
    material: Option<FullscreenMaterial>,
}

impl CopyPass {
    pub fn new() -> Self {
        Self::named("copy")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: PassState::default(),
            material: None,
        }
    }

    pub fn with_render_order(mut self, render_order: i32) -> Self {
        self.state.render_order = render_order;
        self
    }
}

impl Default for CopyPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for CopyPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    fn init(&mut self, backend: &mut dyn RenderBackend, _viewport: &Viewport) -> Result<()> {
        let desc = ProgramDesc::new(self.name.clone(), COPY_SHADER).require(INPUT_TEXTURE);
        self.material = Some(FullscreenMaterial::new(backend.create_program(desc)?));
        Ok(())
    }

    fn render(&mut self, ctx: &mut PassContext<'_>, io: PassIo, _camera: &Camera) -> Result<()> {
        let material = self.material.as_mut().ok_or_else(|| not_initialised(&self.name))?;
        material.draw(ctx, io)
    }

    fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(material) = self.material.take() {
            material.dispose(backend);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) fn not_initialised(name: &str) -> PipelineError {
    PipelineError::InvalidConfig {
        pass: name.to_string(),
        reason: "render called before init".to_string(),
    }
}
