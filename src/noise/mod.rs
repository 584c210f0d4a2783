//! Noise generation module for terrain synthesis.
//!
//! Uses simdnoise for the seeded gradient-noise primitive and layers it into
//! fractal Brownian motion.

mod fractal;
pub mod seed;

pub use fractal::{ConfigError, FbmConfig, GradientNoise2D, NoiseField};
