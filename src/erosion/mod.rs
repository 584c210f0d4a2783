//! Hydraulic erosion.
//!
//! Virtual water droplets trace steepest-descent paths across the height
//! grid, picking up sediment on the way down and dropping it in basins.

mod config;
mod droplet;
mod hydraulic;

pub use config::ErosionConfig;
pub use droplet::{descent_steepness, lowest_neighbor, Droplet, Termination, TraceOutcome, TraceState};
pub use hydraulic::{apply_erosion, erode, sample_drop_indices, ErosionStats};
