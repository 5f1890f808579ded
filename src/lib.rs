pub mod camera;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod core;
pub mod driver;
pub mod error;
pub mod math;
pub mod motion;
pub mod pass;
pub mod render;
pub mod scene;
pub mod scene_renderer;
pub mod scenes;
pub mod scroll;
pub mod stage;
pub mod types;

pub use compositor::Postprocessing;
pub use driver::FrameDriver;
pub use error::{PipelineError, Result};
pub use scene_renderer::SceneRenderer;
