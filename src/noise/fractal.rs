//! Multi-octave noise prior that decides whether a grid node lies above or
//! below the terrain surface.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use simdnoise::NoiseBuilder;

use crate::solver::Side;

/// Half-width of the range octave offsets are drawn from.
pub const OFFSET_RANGE: f32 = 10_000.0;

/// Configuration for the layered noise prior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Number of noise octaves.
    pub octaves: u8,
    /// Distance in grid units covered by one unit of base-octave noise.
    pub scale: f32,
    /// Amplitude decay per octave (0-1).
    pub persistence: f32,
    /// Frequency multiplier per octave (> 1).
    pub lacunarity: f32,
    /// Seed for the octave-offset generator.
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 3,
            scale: 20.0,
            persistence: 0.3,
            lacunarity: 1.4,
            seed: 0,
        }
    }
}

impl NoiseConfig {
    /// Creates the default configuration with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Broad, low-frequency terrain with few isolated pockets.
    pub fn rolling_hills(seed: u64) -> Self {
        Self {
            octaves: 2,
            scale: 32.0,
            persistence: 0.25,
            lacunarity: 1.6,
            seed,
        }
    }

    /// Busier terrain with strong high-frequency detail.
    pub fn rugged(seed: u64) -> Self {
        Self {
            octaves: 5,
            scale: 12.0,
            persistence: 0.55,
            lacunarity: 2.0,
            seed,
        }
    }
}

/// A configured noise sampler.
///
/// The octave offsets come from an explicit ChaCha generator owned by the
/// field, so two fields built from the same configuration always sample
/// identically and [`NoiseField::refresh`] never touches global state.
#[derive(Debug, Clone)]
pub struct NoiseField {
    config: NoiseConfig,
    rng: ChaCha8Rng,
    offsets: Vec<Vec3>,
}

impl NoiseField {
    /// Creates a field and draws its first set of octave offsets from `config.seed`.
    pub fn new(config: NoiseConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut field = Self {
            config,
            rng,
            offsets: Vec::new(),
        };
        field.draw_offsets();
        field
    }

    /// Redraws the octave offsets.
    ///
    /// With `Some(seed)` the generator is reseeded first, so refreshing with
    /// the same seed reproduces the same offsets. With `None` the next offsets
    /// are drawn from the current generator state.
    pub fn refresh(&mut self, seed: Option<u64>) {
        if let Some(seed) = seed {
            self.config.seed = seed;
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.draw_offsets();
    }

    fn draw_offsets(&mut self) {
        let rng = &mut self.rng;
        self.offsets = (0..self.config.octaves)
            .map(|_| {
                Vec3::new(
                    rng.random_range(-OFFSET_RANGE..OFFSET_RANGE),
                    rng.random_range(-OFFSET_RANGE..OFFSET_RANGE),
                    rng.random_range(-OFFSET_RANGE..OFFSET_RANGE),
                )
            })
            .collect();
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Returns the per-octave offsets currently in use.
    pub fn offsets(&self) -> &[Vec3] {
        &self.offsets
    }

    /// Returns the raw weighted octave sum at a grid position.
    ///
    /// Not normalized; only its sign is meaningful to the solver.
    pub fn sample_value(&self, pos: Vec3) -> f32 {
        let mut total = 0.0f32;
        let mut amplitude = 1.0f32;
        let mut frequency = 1.0f32;

        for (octave, offset) in self.offsets.iter().enumerate() {
            let p = (pos + *offset) / self.config.scale * frequency;
            let octave_seed = (self.config.seed as i32).wrapping_add(octave as i32 * 31337);

            total += gradient_3d(p, octave_seed) * amplitude;

            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        total
    }

    /// Returns which side of the surface a grid position falls on.
    pub fn sample(&self, pos: Vec3) -> Side {
        if self.sample_value(pos) < 0.0 {
            Side::Below
        } else {
            Side::Above
        }
    }
}

/// One octave of smooth 3D noise in approximately [-1, 1].
fn gradient_3d(p: Vec3, seed: i32) -> f32 {
    NoiseBuilder::fbm_3d_offset(p.x, 1, p.y, 1, p.z, 1)
        .with_seed(seed)
        .with_freq(1.0)
        .with_octaves(1)
        .generate()
        .0[0]
}
