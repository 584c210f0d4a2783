//! Terrain module.
//!
//! Provides the height grid the generators operate on and the fractal
//! heightmap pass that initializes it.

mod grid;
mod heightmap;

pub use grid::{HeightBuffer, HeightGrid, PlaneConfig};
pub use heightmap::{apply_fbm, generate, generate_batch};
