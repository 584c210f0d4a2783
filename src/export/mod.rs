//! Export module for previewing generated terrain as images.
//!
//! Supports 16-bit grayscale heightmaps and RGB normal maps.

mod normal_map;
mod png;

pub use normal_map::{export_grid_normal_map_png, NormalMapError, NormalMapOptions};
pub use png::{export_grid_png, PngExportError, PngExportOptions};
