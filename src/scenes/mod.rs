mod backdrop;
mod floating;

pub use backdrop::create_backdrop_scene;
pub use floating::{create_floating_scene, FloatingScene};
