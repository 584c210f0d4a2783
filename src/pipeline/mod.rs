//! Pipeline module for orchestrating terrain generation stages.
//!
//! Provides a trait-based architecture for composing the heightmap and
//! erosion passes over one grid.

mod stage;

pub use stage::{
    build_terrain, ErosionStage, GenerationStage, HeightmapStage, Pipeline, PipelineError,
    StageConfig, StageId, StatsHandle,
};
