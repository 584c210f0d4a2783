//! Heightmap generation using fractal noise.

use std::time::Instant;

use rayon::prelude::*;

use super::grid::{HeightBuffer, HeightGrid, PlaneConfig};
use crate::noise::{ConfigError, FbmConfig, NoiseField};

/// Overwrites every vertex height with `noise(x, z) * max_height`.
///
/// Heights are replaced, never blended, so repeated calls with the same
/// configuration give the same field. Noise is evaluated in parallel and
/// written back in index order. Empty grids are left untouched.
pub fn generate<B>(grid: &mut B, config: &FbmConfig) -> Result<(), ConfigError>
where
    B: HeightBuffer + ?Sized,
{
    let noise = NoiseField::new(config)?;
    let count = grid.vertex_count();
    if count == 0 {
        return Ok(());
    }

    let start = Instant::now();
    let planar: Vec<(f32, f32)> = (0..count)
        .map(|i| {
            let p = grid.position(i);
            (p.x, p.z)
        })
        .collect();

    let heights: Vec<f32> = planar
        .par_iter()
        .map(|&(x, z)| noise.get_value(x, z) * config.max_height)
        .collect();

    for (i, height) in heights.into_iter().enumerate() {
        grid.set_height(i, height);
    }
    grid.geometry_changed();

    log::debug!(
        "fbm pass: {} vertices, {} octaves, seed {:?} in {:.2?}",
        count,
        config.octaves,
        config.seed,
        start.elapsed()
    );
    Ok(())
}

/// Positional form of [`generate`].
#[allow(clippy::too_many_arguments)]
pub fn apply_fbm<B>(
    grid: &mut B,
    octaves: u32,
    amplitude: f32,
    lacunarity: f32,
    gain: f32,
    scale: f32,
    max_height: f32,
    seed: &str,
) -> Result<(), ConfigError>
where
    B: HeightBuffer + ?Sized,
{
    let config = FbmConfig {
        octaves,
        amplitude,
        lacunarity,
        gain,
        scale,
        max_height,
        seed: seed.to_string(),
    };
    generate(grid, &config)
}

/// Builds one independent grid per seed, in parallel.
///
/// Each grid is owned by its own task; nothing is shared between them.
pub fn generate_batch(
    plane: &PlaneConfig,
    config: &FbmConfig,
    seeds: &[String],
) -> Result<Vec<HeightGrid>, ConfigError> {
    config.validate()?;

    seeds
        .par_iter()
        .map(|seed| {
            let mut grid = HeightGrid::plane(plane);
            let seeded = FbmConfig {
                seed: seed.clone(),
                ..config.clone()
            };
            generate(&mut grid, &seeded)?;
            Ok(grid)
        })
        .collect()
}
