use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::{unit_hash, PeriodicNoise, MAX_OCTAVES, NOISE_PERIOD};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrownianConfig {
    pub position_amplitude: f32,
    /// Phase advance per second for the three position axes
    pub position_frequency: f32,
    pub position_scale: [f32; 3],
    /// Radians
    pub rotation_amplitude: f32,
    pub rotation_frequency: f32,
    pub rotation_scale: [f32; 3],
    /// 1..=3
    pub octaves: usize,
}

impl Default for BrownianConfig {
    fn default() -> Self {
        Self {
            position_amplitude: 0.3,
            position_frequency: 0.25,
            position_scale: [1.0, 1.0, 1.0],
            rotation_amplitude: 0.08,
            rotation_frequency: 0.2,
            rotation_scale: [1.0, 1.0, 1.0],
            octaves: MAX_OCTAVES,
        }
    }
}

/// Smoothed-noise jitter producing a transform for idle floating motion
///
/// Six phases (three position, three rotation) advance by `frequency * dt`
/// and sample a tileable noise table built once at construction. Reseeding
/// moves the phase origins only.
#[derive(Debug, Clone)]
pub struct BrownianMotion {
    config: BrownianConfig,
    noise: PeriodicNoise,
    origins: [f32; 6],
    phases: [f32; 6],
    position: Vec3,
    rotation: Vec3,
    matrix: Mat4,
}

impl BrownianMotion {
    /// Randomly seeded
    pub fn new(config: BrownianConfig) -> Self {
        Self::with_seed(random_seed(), config)
    }

    /// Deterministic for a given seed
    pub fn with_seed(seed: u64, config: BrownianConfig) -> Self {
        let mut motion = Self {
            config,
            noise: PeriodicNoise::from_seed(seed),
            origins: [0.0; 6],
            phases: [0.0; 6],
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            matrix: Mat4::IDENTITY,
        };
        motion.rehash_with(seed.wrapping_add(1));
        motion
    }

    /// Randomise phase origins
    pub fn rehash(&mut self) {
        self.rehash_with(random_seed());
    }

    /// Set phase origins from `seed`; amplitude, frequency and accumulated
    /// phase are untouched
    pub fn rehash_with(&mut self, seed: u64) {
        for (i, origin) in self.origins.iter_mut().enumerate() {
            *origin = unit_hash(seed, i as u64) * NOISE_PERIOD as f32;
        }
        self.recompute();
    }

    /// Advance by `delta` seconds and recompute the transform
    ///
    /// A zero delta leaves the phases alone, so repeated calls are idempotent.
    pub fn update(&mut self, delta: f32) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        for (i, phase) in self.phases.iter_mut().enumerate() {
            let frequency = if i < 3 {
                self.config.position_frequency
            } else {
                self.config.rotation_frequency
            };
            *phase += frequency * delta;
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        let octaves = self.config.octaves;
        let axis = |i: usize| self.noise.fractal(self.origins[i] + self.phases[i], octaves);

        let position = Vec3::new(axis(0), axis(1), axis(2))
            * Vec3::from_array(self.config.position_scale)
            * self.config.position_amplitude;
        let rotation = Vec3::new(axis(3), axis(4), axis(5))
            * Vec3::from_array(self.config.rotation_scale)
            * self.config.rotation_amplitude;

        self.position = position;
        self.rotation = rotation;
        self.matrix = Mat4::from_scale_rotation_translation(
            Vec3::ONE,
            Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z),
            position,
        );
    }

    pub fn config(&self) -> &BrownianConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn phases(&self) -> [f32; 6] {
        self.phases
    }

    /// `base` with the jitter applied in its local frame
    pub fn apply(&self, base: Mat4) -> Mat4 {
        base * self.matrix
    }
}

fn random_seed() -> u64 {
    RandomState::new().hash_one(0x5eed_u64)
}
