//! Droplet-based hydraulic erosion over a height grid.
//!
//! Droplets run strictly one after another: each trace sees the terrain as
//! left by every earlier trace in the same call.

use std::time::Instant;

use rand::Rng;

use super::droplet::{Droplet, Termination, TraceOutcome};
use super::ErosionConfig;
use crate::noise::seed::rng_from_seed;
use crate::terrain::HeightBuffer;

/// Totals gathered over one erosion call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErosionStats {
    pub drops: u32,
    pub steps: u64,
    /// Height removed from the grid.
    pub eroded: f64,
    /// Height added to the grid, including final deposits.
    pub deposited: f64,
    /// Sediment lost by traces that ran out of capacity.
    pub discarded: f64,
    pub basin_stops: u32,
    pub capacity_stops: u32,
    pub step_limit_stops: u32,
}

impl ErosionStats {
    fn record(&mut self, outcome: &TraceOutcome) {
        self.drops += 1;
        self.steps += outcome.steps as u64;
        self.eroded += outcome.eroded;
        self.deposited += outcome.deposited;
        self.discarded += outcome.discarded;
        match outcome.termination {
            Termination::Basin => self.basin_stops += 1,
            Termination::CapacityExhausted => self.capacity_stops += 1,
            Termination::StepLimit => self.step_limit_stops += 1,
        }
    }

    /// Net height change the grid saw.
    pub fn net_change(&self) -> f64 {
        self.deposited - self.eroded
    }
}

/// Draws `drop_count` start vertices uniformly from `[0, vertex_count - 1)`.
///
/// One sampler step per draw. A single-vertex grid always starts at 0.
pub fn sample_drop_indices(vertex_count: usize, drop_count: u32, seed: &str) -> Vec<usize> {
    if vertex_count == 0 {
        return Vec::new();
    }

    let upper = vertex_count.saturating_sub(1).max(1);
    let mut rng = rng_from_seed(seed);
    (0..drop_count).map(|_| rng.random_range(0..upper)).collect()
}

/// Runs `config.drop_count` droplet traces over `grid`.
///
/// Normals and the dirty flag are refreshed once at the end. An empty grid
/// is left untouched.
pub fn erode<B>(grid: &mut B, config: &ErosionConfig) -> ErosionStats
where
    B: HeightBuffer + ?Sized,
{
    let mut stats = ErosionStats::default();
    let count = grid.vertex_count();
    if count == 0 {
        return stats;
    }

    let start = Instant::now();
    for index in sample_drop_indices(count, config.drop_count, &config.seed) {
        let outcome = Droplet::trace(grid, index, config);
        stats.record(&outcome);
    }
    grid.geometry_changed();

    log::debug!(
        "erosion pass: {} drops, {} steps, eroded {:.4}, deposited {:.4}, discarded {:.4} in {:.2?}",
        stats.drops,
        stats.steps,
        stats.eroded,
        stats.deposited,
        stats.discarded,
        start.elapsed()
    );
    if stats.step_limit_stops > 0 {
        log::warn!(
            "{} of {} droplets hit the {}-step limit",
            stats.step_limit_stops,
            stats.drops,
            config.max_steps_per_drop
        );
    }

    stats
}

/// Positional form of [`erode`] with the default step limit.
#[allow(clippy::too_many_arguments)]
pub fn apply_erosion<B>(
    grid: &mut B,
    drop_count: u32,
    seed: &str,
    capacity: f32,
    erosion_rate: f32,
    deposition_rate: f32,
    evaporation_rate: f32,
) -> ErosionStats
where
    B: HeightBuffer + ?Sized,
{
    let config = ErosionConfig {
        drop_count,
        seed: seed.to_string(),
        capacity,
        erosion_rate,
        deposition_rate,
        evaporation_rate,
        ..ErosionConfig::default()
    };
    erode(grid, &config)
}
