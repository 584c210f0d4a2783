//! Generation stage trait and pipeline orchestration.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::erosion::{erode, ErosionConfig, ErosionStats};
use crate::noise::{ConfigError, FbmConfig};
use crate::terrain::{generate, HeightBuffer, HeightGrid, PlaneConfig};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Initial heightmap generation from noise.
    Heightmap,
    /// Droplet erosion.
    Erosion,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Heightmap => "heightmap",
            StageId::Erosion => "erosion",
        }
    }
}

/// Configuration passed to each generation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Fractal noise parameters for the heightmap.
    pub fbm: FbmConfig,
    /// Droplet erosion parameters.
    pub erosion: ErosionConfig,
}

impl StageConfig {
    /// Creates a configuration with the given noise settings and default erosion.
    pub fn with_fbm(fbm: FbmConfig) -> Self {
        Self {
            fbm,
            erosion: ErosionConfig::default(),
        }
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{0}' failed: {1}")]
    StageFailed(String, String),
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Trait for implementing generation stages.
///
/// Each stage mutates the grid heights in place, building upon the stages
/// before it.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the generation stage, modifying the grid in place.
    fn execute(&self, grid: &mut dyn HeightBuffer, config: &StageConfig) -> Result<(), PipelineError>;
}

/// Orchestrates generation stages over a single grid.
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
    config: StageConfig,
}

impl Pipeline {
    /// Creates a new empty pipeline with the given configuration.
    pub fn new(config: StageConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// A pipeline running the heightmap and erosion stages.
    pub fn standard(config: StageConfig) -> Self {
        let mut pipeline = Self::new(config);
        pipeline.add_stage(HeightmapStage).add_stage(ErosionStage::new());
        pipeline
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Executes all stages in order on the given grid.
    pub fn run(&self, grid: &mut dyn HeightBuffer) -> Result<(), PipelineError> {
        self.run_with_callbacks(grid, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// # Arguments
    /// * `grid` - The grid to generate
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        grid: &mut dyn HeightBuffer,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            stage.execute(grid, &self.config)?;
            completed.push(stage.id());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Heightmap generation stage using fractal noise.
pub struct HeightmapStage;

impl GenerationStage for HeightmapStage {
    fn id(&self) -> StageId {
        StageId::Heightmap
    }

    fn name(&self) -> &str {
        "Heightmap Generation"
    }

    fn execute(&self, grid: &mut dyn HeightBuffer, config: &StageConfig) -> Result<(), PipelineError> {
        generate(grid, &config.fbm)?;
        Ok(())
    }
}

/// Shared slot holding the statistics of an erosion stage's last run.
pub type StatsHandle = Arc<Mutex<Option<ErosionStats>>>;

/// Droplet erosion stage. Keeps the statistics of its last run.
#[derive(Default)]
pub struct ErosionStage {
    last_stats: StatsHandle,
}

impl ErosionStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that still reads the statistics after the stage has been
    /// moved into a [`Pipeline`].
    pub fn stats_handle(&self) -> StatsHandle {
        Arc::clone(&self.last_stats)
    }

    /// Statistics from the most recent execution, if any.
    pub fn last_stats(&self) -> Option<ErosionStats> {
        self.last_stats.lock().ok().and_then(|stats| stats.clone())
    }
}

impl GenerationStage for ErosionStage {
    fn id(&self) -> StageId {
        StageId::Erosion
    }

    fn name(&self) -> &str {
        "Droplet Erosion"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Heightmap]
    }

    fn execute(&self, grid: &mut dyn HeightBuffer, config: &StageConfig) -> Result<(), PipelineError> {
        let stats = erode(grid, &config.erosion);
        let mut slot = self
            .last_stats
            .lock()
            .map_err(|e| PipelineError::StageFailed(self.name().to_string(), e.to_string()))?;
        *slot = Some(stats);
        Ok(())
    }
}

/// Builds a fresh grid for `plane`, generates heights and erodes them.
///
/// Mirrors a host rebuilding its terrain after every configuration change:
/// the previous grid is simply dropped and replaced by the returned one.
pub fn build_terrain(
    plane: &PlaneConfig,
    config: &StageConfig,
) -> Result<(HeightGrid, ErosionStats), PipelineError> {
    config.fbm.validate()?;

    let mut grid = HeightGrid::plane(plane);
    generate(&mut grid, &config.fbm)?;
    let stats = erode(&mut grid, &config.erosion);
    Ok((grid, stats))
}
