pub mod copy;
pub mod output;
pub mod shader;
pub mod transition;

use std::any::Any;

use glam::Vec2;

use crate::camera::Camera;
use crate::core::{FrameInfo, StageContext, Viewport};
use crate::error::Result;
use crate::render::{Destination, FullscreenInputs, Program, RenderBackend, TargetId};
use crate::types::PassUniforms;

pub use copy::CopyPass;
pub use output::{OutputPass, OutputPassConfig};
pub use shader::{ShaderPass, ShaderPassConfig};
pub use transition::{TransitionPass, TransitionPassConfig};

/// Flags every pass carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassState {
    pub enabled: bool,
    /// Ascending; ties keep registration order
    pub render_order: i32,
    /// Sample the pass's own bound input instead of the chain's read target
    pub override_input: bool,
}

impl Default for PassState {
    fn default() -> Self {
        Self {
            enabled: true,
            render_order: 0,
            override_input: false,
        }
    }
}

/// Uniforms owned by the compositor, read-only to passes
///
/// `from_texture`/`to_texture` alias the ping-pong pair and are refreshed on
/// every swap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedUniforms {
    pub from_texture: TargetId,
    pub to_texture: TargetId,
    pub resolution: Vec2,
    pub time: f32,
}

/// Per-invocation inputs handed to `Pass::render`
pub struct PassContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub shared: &'a SharedUniforms,
    pub frame: FrameInfo,
}

/// Where a pass reads from and writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassIo {
    pub input: TargetId,
    pub output: TargetId,
    /// Write to the screen instead of `output`
    pub render_to_screen: bool,
    /// Leave the pass's own input binding alone
    pub override_input: bool,
}

impl PassIo {
    pub fn destination(&self) -> Destination {
        if self.render_to_screen {
            Destination::Screen
        } else {
            Destination::Target(self.output)
        }
    }
}

/// A full-screen image-processing step in the compositor chain
pub trait Pass {
    /// Name for lookups and logging
    fn name(&self) -> &str;

    fn state(&self) -> &PassState;

    fn state_mut(&mut self) -> &mut PassState;

    fn enabled(&self) -> bool {
        self.state().enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.state_mut().enabled = enabled;
    }

    fn render_order(&self) -> i32 {
        self.state().render_order
    }

    /// Allocate the program and any private targets; failure keeps the pass
    /// out of the queue
    fn init(&mut self, backend: &mut dyn RenderBackend, viewport: &Viewport) -> Result<()>;

    /// Called on every viewport change with the drawing-buffer size
    fn resize(&mut self, _backend: &mut dyn RenderBackend, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    /// Per-frame update before rendering
    fn update(&mut self, _frame: &FrameInfo, _ctx: &StageContext) {}

    /// Draw once; called only while enabled
    fn render(&mut self, ctx: &mut PassContext<'_>, io: PassIo, camera: &Camera) -> Result<()>;

    /// Release programs and private targets
    fn dispose(&mut self, backend: &mut dyn RenderBackend);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A program plus the bindings it draws with
///
/// The input binding persists between draws, so a pass that overrides it
/// keeps sampling its own texture.
#[derive(Debug)]
pub struct FullscreenMaterial {
    pub program: Program,
    pub input: Option<TargetId>,
    pub aux: Option<TargetId>,
    pub uniforms: PassUniforms,
}

impl FullscreenMaterial {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            input: None,
            aux: None,
            uniforms: PassUniforms::default(),
        }
    }

    /// Bind inputs, target the destination and draw one triangle
    pub fn draw(&mut self, ctx: &mut PassContext<'_>, io: PassIo) -> Result<()> {
        if !io.override_input && self.program.reads_input() {
            self.input = Some(io.input);
        }
        self.uniforms.resolution = ctx.shared.resolution.to_array();
        self.uniforms.time = ctx.shared.time;

        ctx.backend.set_render_target(io.destination());
        ctx.backend.draw_fullscreen(
            &mut self.program,
            &FullscreenInputs {
                input: self.input,
                aux: self.aux,
                uniforms: self.uniforms,
            },
        )
    }

    pub fn dispose(&self, backend: &mut dyn RenderBackend) {
        backend.dispose_program(&self.program);
    }
}
