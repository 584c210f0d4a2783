//! Multi-octave fractal Brownian motion (fBm) noise over a seeded 2D primitive.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::seed::noise_seed;

/// Errors raised when a noise configuration cannot be evaluated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Parameters for fractal terrain generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FbmConfig {
    /// Number of noise octaves (must be at least 1).
    pub octaves: u32,
    /// Amplitude of the first octave. Cancels out in the normalization.
    pub amplitude: f32,
    /// Frequency multiplier per octave (typically 2.0).
    pub lacunarity: f32,
    /// Amplitude multiplier per octave (typically below 1.0).
    pub gain: f32,
    /// World units per noise unit. Must be non-zero.
    pub scale: f32,
    /// Multiplier applied to the normalized noise value to get a height.
    pub max_height: f32,
    /// Seed string for reproducible generation.
    pub seed: String,
}

impl Default for FbmConfig {
    fn default() -> Self {
        Self {
            octaves: 8,
            amplitude: 15.0,
            lacunarity: 2.0,
            gain: 0.5,
            scale: 100.0,
            max_height: 10.0,
            seed: "seed".to_string(),
        }
    }
}

impl FbmConfig {
    /// Creates a default configuration with the given seed.
    pub fn with_seed(seed: &str) -> Self {
        Self {
            seed: seed.to_string(),
            ..Default::default()
        }
    }

    /// Broad, low-detail terrain.
    pub fn rolling_hills(seed: &str) -> Self {
        Self {
            octaves: 3,
            gain: 0.4,
            scale: 150.0,
            max_height: 6.0,
            ..Self::with_seed(seed)
        }
    }

    /// High-detail terrain with pronounced relief.
    pub fn rugged(seed: &str) -> Self {
        Self {
            octaves: 10,
            lacunarity: 2.2,
            gain: 0.55,
            scale: 60.0,
            max_height: 20.0,
            ..Self::with_seed(seed)
        }
    }

    /// Rejects configurations that would divide by zero during evaluation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.octaves < 1 {
            return Err(ConfigError::InvalidConfiguration(format!(
                "octaves must be at least 1 (got {})",
                self.octaves
            )));
        }
        if self.scale == 0.0 || !self.scale.is_finite() {
            return Err(ConfigError::InvalidConfiguration(format!(
                "scale must be finite and non-zero (got {})",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Seeded 2D gradient noise, roughly in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientNoise2D {
    seed: i32,
}

impl GradientNoise2D {
    /// Builds the primitive for a seed string.
    pub fn new(seed: &str) -> Self {
        Self {
            seed: noise_seed(seed),
        }
    }

    /// Samples the noise at `(x, y)`.
    ///
    /// Same value as a one-octave `NoiseBuilder` fbm at frequency 1, evaluated
    /// without building a noise block per point.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        // SAFETY: the scalar backend uses no target-specific instructions.
        unsafe { simdnoise::scalar::simplex_2d(x, y, self.seed) }
    }
}

/// Fractal noise evaluator owning its seeded primitive.
///
/// Output is a pure function of the parameters and the seed: identical
/// inputs always give identical values.
#[derive(Debug, Clone)]
pub struct NoiseField {
    octaves: u32,
    amplitude: f32,
    lacunarity: f32,
    gain: f32,
    scale: f32,
    seed: String,
    primitive: GradientNoise2D,
}

impl NoiseField {
    /// Creates a noise field from a validated configuration.
    pub fn new(config: &FbmConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            octaves: config.octaves,
            amplitude: config.amplitude,
            lacunarity: config.lacunarity,
            gain: config.gain,
            scale: config.scale,
            seed: config.seed.clone(),
            primitive: GradientNoise2D::new(&config.seed),
        })
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Replaces the primitive with one built from `seed`.
    pub fn set_seed(&mut self, seed: &str) {
        self.seed = seed.to_string();
        self.primitive = GradientNoise2D::new(seed);
    }

    /// The underlying single-octave primitive.
    pub fn primitive(&self) -> &GradientNoise2D {
        &self.primitive
    }

    /// Evaluates the fBm at planar position `(x, z)`.
    ///
    /// The sum is divided by the total amplitude, so the result stays in the
    /// primitive's range regardless of the octave count.
    pub fn get_value(&self, x: f32, z: f32) -> f32 {
        let mut frequency = 1.0f32;
        let mut amplitude = self.amplitude;
        let mut total = 0.0f32;
        let mut total_amplitude = 0.0f32;

        for _ in 0..self.octaves {
            let sx = (x / self.scale) * frequency;
            let sz = (z / self.scale) * frequency;
            total += self.primitive.sample(sx, sz) * amplitude;
            total_amplitude += amplitude;
            amplitude *= self.gain;
            frequency *= self.lacunarity;
        }

        total / total_amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simdnoise::NoiseBuilder;

    #[test]
    fn test_default_config() {
        let config = FbmConfig::default();
        assert_eq!(config.octaves, 8);
        assert_eq!(config.lacunarity, 2.0);
        assert_eq!(config.gain, 0.5);
        assert_eq!(config.seed, "seed");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_octaves_rejected() {
        let config = FbmConfig {
            octaves: 0,
            ..Default::default()
        };
        assert!(matches!(
            NoiseField::new(&config),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let config = FbmConfig {
            scale: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = FbmConfig {
            scale: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_noise_reproducibility() {
        let config = FbmConfig::with_seed("reproducible");
        let a = NoiseField::new(&config).unwrap();
        let b = NoiseField::new(&config).unwrap();

        for &(x, z) in &[(12.3, 45.6), (-31.7, 8.25), (0.5, -99.1)] {
            let first = a.get_value(x, z);
            assert_eq!(first, a.get_value(x, z), "Repeated calls should agree");
            assert_eq!(first, b.get_value(x, z), "Re-instantiation should agree");
        }
    }

    #[test]
    fn test_different_seeds_produce_different_results() {
        let a = NoiseField::new(&FbmConfig::with_seed("one")).unwrap();
        let b = NoiseField::new(&FbmConfig::with_seed("two")).unwrap();

        let points = [(12.3, 45.6), (-31.7, 8.25), (77.7, -13.3), (5.5, 5.5)];
        let differing = points
            .iter()
            .filter(|&&(x, z)| a.get_value(x, z) != b.get_value(x, z))
            .count();
        assert!(differing > 0, "Different seeds should produce different fields");
    }

    #[test]
    fn test_single_octave_matches_primitive() {
        let config = FbmConfig {
            octaves: 1,
            amplitude: 15.0,
            scale: 40.0,
            ..FbmConfig::with_seed("single")
        };
        let field = NoiseField::new(&config).unwrap();

        for &(x, z) in &[(12.3, 45.6), (-31.7, 8.25), (90.0, 3.0)] {
            let raw = field.primitive().sample(x / 40.0, z / 40.0);
            let value = field.get_value(x, z);
            assert!(
                (value - raw).abs() < 1e-5,
                "Single octave {} should equal raw primitive {}",
                value,
                raw
            );
        }
    }

    #[test]
    fn test_primitive_matches_builder_block() {
        let primitive = GradientNoise2D::new("block");
        let seed = noise_seed("block");

        for &(x, y) in &[(0.3, 1.7), (-2.25, 0.5), (11.0, -4.4)] {
            let block = NoiseBuilder::fbm_2d_offset(x, 1, y, 1)
                .with_seed(seed)
                .with_freq(1.0)
                .with_octaves(1)
                .generate()
                .0[0];
            let value = primitive.sample(x, y);
            assert!(
                (value - block).abs() < 1e-5,
                "Point sample {} should match block sample {}",
                value,
                block
            );
        }
    }

    #[test]
    fn test_set_seed_replaces_primitive() {
        let mut field = NoiseField::new(&FbmConfig::with_seed("first")).unwrap();
        let fresh = NoiseField::new(&FbmConfig::with_seed("second")).unwrap();

        field.set_seed("second");
        assert_eq!(field.seed(), "second");
        assert_eq!(field.primitive(), fresh.primitive());
        assert_eq!(field.get_value(21.5, -7.25), fresh.get_value(21.5, -7.25));
    }

    #[test]
    fn test_noise_range() {
        let field = NoiseField::new(&FbmConfig::default()).unwrap();
        for i in 0..50 {
            let x = i as f32 * 3.7 - 90.0;
            let z = i as f32 * -2.3 + 40.0;
            let value = field.get_value(x, z);
            assert!(
                value.is_finite() && value.abs() <= 2.0,
                "Noise value {} at ({}, {}) out of expected range",
                value,
                x,
                z
            );
        }
    }

    #[test]
    fn test_noise_is_continuous() {
        let field = NoiseField::new(&FbmConfig::rolling_hills("smooth")).unwrap();
        let a = field.get_value(10.0, 10.0);
        let b = field.get_value(10.001, 10.0);
        assert!((a - b).abs() < 0.01);
    }
}
