//! PNG heightmap previews.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Luma};
use thiserror::Error;

use crate::terrain::{HeightBuffer, HeightGrid};

/// Errors that can occur during PNG export.
#[derive(Error, Debug)]
pub enum PngExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
    #[error("Grid has no complete rows to export")]
    EmptyGrid,
}

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// Height mapped to black.
    pub min_height: f32,
    /// Height mapped to white.
    pub max_height: f32,
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            min_height: -10.0,
            max_height: 10.0,
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl PngExportOptions {
    /// Creates options spanning the grid's actual height range.
    ///
    /// A flat grid gets a unit range around its height so export still works.
    pub fn auto_range(grid: &HeightGrid) -> Self {
        let (min, mut max) = grid.height_range();
        if min >= max {
            max = min + 1.0;
        }
        Self {
            min_height: min,
            max_height: max,
            ..Default::default()
        }
    }
}

/// Writes the grid heights as a 16-bit grayscale PNG, one pixel per vertex.
///
/// Rows of the grid become image rows; trailing vertices of an incomplete
/// row are skipped.
pub fn export_grid_png(
    grid: &HeightGrid,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    let min = options.min_height;
    let max = options.max_height;

    if min >= max {
        return Err(PngExportError::InvalidHeightRange(min, max));
    }

    let width = grid.row_width() as u32;
    let rows = grid.rows() as u32;
    if rows == 0 {
        return Err(PngExportError::EmptyGrid);
    }
    let range = max - min;

    let mut img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::new(width, rows);

    for y in 0..rows {
        for x in 0..width {
            let height = grid.height((y * width + x) as usize);
            let normalized = ((height - min) / range).clamp(0.0, 1.0);
            let value = (normalized * 65535.0) as u16;
            img.put_pixel(x, y, Luma([value]));
        }
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);

    let raw_data = img.as_raw();
    let byte_slice: &[u8] = bytemuck::cast_slice(raw_data);

    encoder.write_image(byte_slice, width, rows, image::ExtendedColorType::L16)?;

    Ok(())
}
