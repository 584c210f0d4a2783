//! Normal map previews from grid vertex normals.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use glam::Vec3;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Rgb};
use thiserror::Error;

use crate::terrain::{HeightBuffer, HeightGrid};

/// Errors that can occur during normal map export.
#[derive(Error, Debug)]
pub enum NormalMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Grid has no complete rows to export")]
    EmptyGrid,
}

#[derive(Debug, Clone)]
pub struct NormalMapOptions {
    pub compression: CompressionType,
    pub filter: FilterType,
}

impl Default for NormalMapOptions {
    fn default() -> Self {
        Self {
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

/// Maps a y-up normal to RGB with the up axis in blue.
fn encode_normal_rgb8(n: Vec3) -> [u8; 3] {
    let tangent = Vec3::new(n.x, n.z, n.y);
    let c = (tangent * 0.5) + Vec3::splat(0.5);
    [
        (c.x.clamp(0.0, 1.0) * 255.0) as u8,
        (c.y.clamp(0.0, 1.0) * 255.0) as u8,
        (c.z.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

/// Writes the grid's vertex normals as an RGB PNG, one pixel per vertex.
///
/// Uses the normals stored on the grid, so call after a pass (or after
/// [`HeightGrid::compute_vertex_normals`]) to see current geometry.
pub fn export_grid_normal_map_png(
    grid: &HeightGrid,
    path: &Path,
    options: &NormalMapOptions,
) -> Result<(), NormalMapError> {
    let width = grid.row_width() as u32;
    let rows = grid.rows() as u32;
    if rows == 0 {
        return Err(NormalMapError::EmptyGrid);
    }

    let normals = grid.normals();
    let mut img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, rows);

    for y in 0..rows {
        for x in 0..width {
            let n = normals[(y * width + x) as usize];
            img.put_pixel(x, y, Rgb(encode_normal_rgb8(n)));
        }
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);
    encoder.write_image(img.as_raw(), width, rows, image::ExtendedColorType::Rgb8)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_up_normal_is_blue() {
        assert_eq!(encode_normal_rgb8(Vec3::Y), [127, 127, 255]);
    }

    #[test]
    fn test_export_flat_normal_map() {
        let grid = HeightGrid::from_heights(4, &[1.0; 16], 1.0);
        let dir = tempdir().unwrap();
        let path = dir.path().join("normals.png");

        export_grid_normal_map_png(&grid, &path, &NormalMapOptions::default()).unwrap();

        let img = image::open(&path).unwrap().into_rgb8();
        assert_eq!(img.dimensions(), (4, 4));
        assert!(img.pixels().all(|p| p.0 == [127, 127, 255]));
    }

    #[test]
    fn test_empty_grid_rejected() {
        let grid = HeightGrid::from_positions(Vec::new(), 1);
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.png");

        let result = export_grid_normal_map_png(&grid, &path, &NormalMapOptions::default());
        assert!(matches!(result, Err(NormalMapError::EmptyGrid)));
    }
}
