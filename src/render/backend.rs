use serde::{Deserialize, Serialize};

use super::program::{Program, ProgramDesc};
use super::target::{Destination, TargetDesc, TargetId};
use crate::camera::CameraMatrices;
use crate::error::Result;
use crate::scene::Scene;
use crate::types::PassUniforms;

pub type Rgba = [f32; 4];

/// Tone-mapping operator applied by the output pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    None,
    Linear,
    Reinhard,
    Cineon,
    #[default]
    AcesFilmic,
    #[serde(rename = "agx")]
    AgX,
}

impl ToneMapping {
    /// Value of the `TONE_MAPPING` shader constant
    pub fn shader_id(&self) -> u32 {
        match self {
            ToneMapping::None => 0,
            ToneMapping::Linear => 1,
            ToneMapping::Reinhard => 2,
            ToneMapping::Cineon => 3,
            ToneMapping::AcesFilmic => 4,
            ToneMapping::AgX => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

/// Renderer-global output settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub tone_mapping: ToneMapping,
    pub color_space: ColorSpace,
}

/// Texture inputs and uniforms for one full-screen draw
#[derive(Debug, Clone, Copy, Default)]
pub struct FullscreenInputs {
    /// Bound to `t_input`; `None` binds a 1x1 fallback
    pub input: Option<TargetId>,
    /// Bound to `t_aux`; `None` binds a 1x1 fallback
    pub aux: Option<TargetId>,
    pub uniforms: PassUniforms,
}

/// Renderer abstraction the compositor drives
///
/// Holds renderer-global state (destination, clear colour, auto-clear, output
/// settings) that passes may read and must restore if they change it.
pub trait RenderBackend {
    /// Start a frame; draws are only valid between begin and end
    fn begin_frame(&mut self) -> Result<()>;

    /// Submit and present
    fn end_frame(&mut self) -> Result<()>;

    /// Drawing-buffer size of the screen
    fn screen_size(&self) -> (u32, u32);

    fn resize_screen(&mut self, width: u32, height: u32);

    /// Allocate storage for a new offscreen buffer
    ///
    /// May change the current destination; callers snapshot it if they care.
    fn create_target(&mut self, desc: &TargetDesc) -> TargetId;

    /// Replace a target's storage at a new size; the id stays valid and old
    /// contents are undefined
    fn resize_target(&mut self, id: TargetId, width: u32, height: u32) -> Result<()>;

    /// Release a target's storage; the id must not be used afterwards
    fn dispose_target(&mut self, id: TargetId);

    fn target_size(&self, id: TargetId) -> Option<(u32, u32)>;

    fn set_render_target(&mut self, destination: Destination);

    fn render_target(&self) -> Destination;

    fn clear_color(&self) -> Rgba;

    fn set_clear_color(&mut self, color: Rgba);

    fn auto_clear(&self) -> bool;

    fn set_auto_clear(&mut self, enabled: bool);

    fn output_settings(&self) -> OutputSettings;

    fn set_output_settings(&mut self, settings: OutputSettings);

    /// Compile and validate a full-screen program; failure is fatal for the caller
    fn create_program(&mut self, desc: ProgramDesc) -> Result<Program>;

    fn dispose_program(&mut self, program: &Program);

    /// Render scene content into the current destination, clearing first if
    /// auto-clear is on
    fn render_scene(&mut self, scene: &dyn Scene, camera: &CameraMatrices) -> Result<()>;

    /// Draw a full-viewport triangle into the current destination, relinking
    /// the program first if its defines changed
    fn draw_fullscreen(&mut self, program: &mut Program, inputs: &FullscreenInputs) -> Result<()>;
}

/// Snapshot of the renderer state a pass chain may disturb
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererState {
    pub destination: Destination,
    pub clear_color: Rgba,
    pub auto_clear: bool,
}

impl RendererState {
    pub fn capture(backend: &dyn RenderBackend) -> Self {
        Self {
            destination: backend.render_target(),
            clear_color: backend.clear_color(),
            auto_clear: backend.auto_clear(),
        }
    }

    pub fn restore(&self, backend: &mut dyn RenderBackend) {
        backend.set_render_target(self.destination);
        backend.set_clear_color(self.clear_color);
        backend.set_auto_clear(self.auto_clear);
    }
}
