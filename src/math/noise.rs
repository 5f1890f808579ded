use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Period of the noise lattice. Sampling at `x` and `x + NOISE_PERIOD` is identical.
pub const NOISE_PERIOD: usize = 256;

/// Highest octave count the fractal sum supports.
pub const MAX_OCTAVES: usize = 3;

/// 1 / (1 + 1/2 + 1/4 ...) for each octave count, so a fractal sum peaks at
/// the same amplitude as a single octave.
const OCTAVE_NORMALIZATION: [f32; MAX_OCTAVES] = [1.0, 1.0 / 1.5, 1.0 / 1.75];

/// Tileable 1D value noise with smoothstep interpolation.
///
/// The lattice is filled once from a seed; the same seed always produces the
/// same table.
#[derive(Clone)]
pub struct PeriodicNoise {
    table: Vec<f32>,
}

impl PeriodicNoise {
    pub fn from_seed(seed: u64) -> Self {
        let table = (0..NOISE_PERIOD)
            .map(|i| unit_hash(seed, i as u64) * 2.0 - 1.0)
            .collect();
        Self { table }
    }

    /// Smoothed lattice sample in `[-1, 1]`.
    pub fn sample(&self, x: f32) -> f32 {
        let cell = x.floor();
        let f = x - cell;
        let i0 = (cell as i64).rem_euclid(NOISE_PERIOD as i64) as usize;
        let i1 = (i0 + 1) % NOISE_PERIOD;
        let s = f * f * (3.0 - 2.0 * f);
        self.table[i0] + (self.table[i1] - self.table[i0]) * s
    }

    /// Fractal sum with halving weight and doubling frequency per octave.
    pub fn fractal(&self, x: f32, octaves: usize) -> f32 {
        let octaves = octaves.clamp(1, MAX_OCTAVES);
        let mut sum = 0.0;
        let mut weight = 1.0;
        let mut frequency = 1.0;
        for octave in 0..octaves {
            // offset each octave so they don't share lattice points
            sum += self.sample(x * frequency + octave as f32 * 17.0) * weight;
            weight *= 0.5;
            frequency *= 2.0;
        }
        sum * OCTAVE_NORMALIZATION[octaves - 1]
    }
}

impl std::fmt::Debug for PeriodicNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicNoise")
            .field("period", &self.table.len())
            .finish()
    }
}

/// Deterministic hash of `(seed, index)` into `[0, 1)`.
pub fn unit_hash(seed: u64, index: u64) -> f32 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    index.hash(&mut hasher);
    (hasher.finish() >> 40) as f32 / (1u64 << 24) as f32
}
