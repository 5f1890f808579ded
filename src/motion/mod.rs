//! Procedural idle motion.

pub mod brownian;

pub use brownian::{BrownianConfig, BrownianMotion};
