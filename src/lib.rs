//! Procedural terrain with droplet erosion.
//!
//! This crate fills a planar height grid with seeded fractal noise and then
//! weathers it by tracing virtual water droplets downhill, moving sediment
//! from slopes into basins. Rendering is left to the caller; the passes only
//! mutate heights and flag the geometry as changed.

pub mod noise;
pub mod terrain;
pub mod erosion;
pub mod pipeline;
pub mod export;

pub use noise::{ConfigError, FbmConfig, NoiseField};
pub use terrain::{generate, HeightBuffer, HeightGrid, PlaneConfig};
pub use erosion::{erode, ErosionConfig, ErosionStats};
pub use pipeline::{build_terrain, ErosionStage, GenerationStage, HeightmapStage, Pipeline, PipelineError, StageConfig};
