//! Erosion configuration.

use serde::{Deserialize, Serialize};

fn default_max_steps_per_drop() -> u32 {
    10_000
}

/// Parameters for droplet erosion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErosionConfig {
    /// Number of droplets to trace.
    pub drop_count: u32,
    /// Seed string for the start-position sampler.
    pub seed: String,
    /// Initial sediment capacity of each droplet.
    pub capacity: f32,
    /// How strongly flat-ish moves dig into the terrain.
    pub erosion_rate: f32,
    /// Fraction of carried sediment dropped per step (scaled by slope).
    pub deposition_rate: f32,
    /// Per-step capacity multiplier (scaled by slope). Expected in (0, 1].
    pub evaporation_rate: f32,
    /// Hard bound on steps per droplet.
    #[serde(default = "default_max_steps_per_drop")]
    pub max_steps_per_drop: u32,
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self {
            drop_count: 1,
            seed: "seed".to_string(),
            capacity: 30.0,
            erosion_rate: 1.0,
            deposition_rate: 1.0,
            evaporation_rate: 0.1,
            max_steps_per_drop: default_max_steps_per_drop(),
        }
    }
}

impl ErosionConfig {
    /// Default parameters with the given number of droplets.
    pub fn with_drops(drop_count: u32) -> Self {
        Self {
            drop_count,
            ..Default::default()
        }
    }
}
