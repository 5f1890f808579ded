mod color;
mod easing;
mod noise;
mod reflect;
mod remap;

pub use color::hsv_to_rgba;
pub use easing::Easing;
pub use noise::{unit_hash, PeriodicNoise, MAX_OCTAVES, NOISE_PERIOD};
pub use reflect::{oblique_near_plane, reflection_matrix, Plane};
pub use remap::{lerp, remap, remap_clamped, saturate};
