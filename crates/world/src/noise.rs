//! Fractal Perlin noise backing the reference world's terrain and biome layouts.

use noise::{NoiseFn, Perlin};

/// Octave settings for one noise field.
#[derive(Debug, Clone)]
pub struct NoiseConfig {
    pub octaves: u32,
    /// Frequency multiplier between octaves
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves
    pub persistence: f64,
    /// Frequency of the first octave, in cycles per block
    pub frequency: f64,
    pub seed: u32,
}

impl NoiseConfig {
    /// Rolling hills with a wavelength of about a hundred blocks.
    pub fn hills(seed: u32) -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            frequency: 0.01,
            seed,
        }
    }

    /// Patches a few chunks across, used to scatter biomes.
    pub fn patches(seed: u32) -> Self {
        Self {
            octaves: 2,
            lacunarity: 2.0,
            persistence: 0.5,
            frequency: 0.004,
            // Keep patches uncorrelated with hills built from the same seed.
            seed: seed.wrapping_add(3000),
        }
    }
}

/// Multi-octave Perlin noise over the XZ plane.
pub struct NoiseGenerator {
    perlin: Perlin,
    config: NoiseConfig,
}

impl NoiseGenerator {
    pub fn new(config: NoiseConfig) -> Self {
        Self {
            perlin: Perlin::new(config.seed),
            config,
        }
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Normalised fractal noise at a column, clamped to `[-1.0, 1.0]`.
    pub fn sample_2d(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut weight = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.frequency;

        for _ in 0..self.config.octaves {
            total += self.perlin.get([x * frequency, z * frequency]) * amplitude;
            weight += amplitude;
            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        if weight == 0.0 {
            return 0.0;
        }
        (total / weight).clamp(-1.0, 1.0)
    }

    /// [`sample_2d`](Self::sample_2d) mapped linearly onto `[min, max]`.
    pub fn sample_2d_range(&self, x: f64, z: f64, min: f64, max: f64) -> f64 {
        let unit = (self.sample_2d(x, z) + 1.0) * 0.5;
        min + unit * (max - min)
    }
}

impl std::fmt::Debug for NoiseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseGenerator")
            .field("config", &self.config)
            .finish()
    }
}
