pub mod clock;
pub mod context;
pub mod frame;
pub mod gpu_context;
pub mod input;
pub mod timer;
pub mod viewport;

pub use clock::{clamp_delta, Clock, MAX_FRAME_DELTA};
pub use context::StageContext;
pub use frame::FrameInfo;
pub use gpu_context::GpuContext;
pub use input::{InputState, MAX_WHEEL_DELTA};
pub use timer::{Countdown, Throttled};
pub use viewport::Viewport;
