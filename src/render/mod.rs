pub mod backend;
pub mod gpu;
pub mod headless;
pub mod program;
pub mod target;

pub use backend::{
    ColorSpace, FullscreenInputs, OutputSettings, RenderBackend, RendererState, Rgba, ToneMapping,
};
pub use gpu::GpuBackend;
pub use headless::{HeadlessBackend, RenderCommand};
pub use program::{compile, Define, Program, ProgramDesc, ProgramId, FRAGMENT_ENTRY, INPUT_TEXTURE};
pub use target::{Destination, FilterMode, PixelFormat, TargetDesc, TargetId, WrapMode};
