use crate::render::TargetId;

/// Errors raised while building or driving the render pipeline.
///
/// Shader and configuration failures are fatal at init time; callers are
/// expected to abort pipeline construction when one surfaces.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("shader `{label}` failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    #[error("shader `{label}` is missing required uniform `{name}`")]
    MissingUniform { label: String, name: String },

    #[error("invalid configuration for pass `{pass}`: {reason}")]
    InvalidConfig { pass: String, reason: String },

    #[error("render target {0:?} does not exist")]
    UnknownTarget(TargetId),

    #[error("draw issued outside of begin_frame/end_frame")]
    NoActiveFrame,

    #[error("pipeline used after dispose")]
    Disposed,

    #[error("no compatible GPU adapter: {0}")]
    Adapter(String),

    #[error("failed to create GPU device: {0}")]
    Device(String),

    #[error("surface error: {0}")]
    Surface(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
