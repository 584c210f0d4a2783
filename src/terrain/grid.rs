//! Row-major height grid and the buffer trait the generators mutate.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A row-major buffer of 3D vertex positions whose `y` component is the height.
///
/// Generation and erosion only touch heights; `x` and `z` stay where the
/// owner placed them.
pub trait HeightBuffer {
    /// Total number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of vertices per row.
    fn row_width(&self) -> usize;

    /// Position of vertex `index`.
    fn position(&self, index: usize) -> Vec3;

    fn height(&self, index: usize) -> f32 {
        self.position(index).y
    }

    fn set_height(&mut self, index: usize, height: f32);

    /// Called once after a pass mutated heights. Implementations recompute
    /// normals and flag the geometry for re-upload.
    fn geometry_changed(&mut self);

    /// Grid neighbours of `index` in the order north, south, west, east.
    ///
    /// Candidates are filtered to `[0, vertex_count)` only. Row boundaries are
    /// not special-cased, so west/east of an edge vertex may land in the
    /// adjacent row.
    fn neighbors_4(&self, index: usize) -> [Option<usize>; 4] {
        let count = self.vertex_count();
        let row = self.row_width();
        let within = |i: usize| (i < count).then_some(i);

        [
            index.checked_sub(row).and_then(within),
            index.checked_add(row).and_then(within),
            index.checked_sub(1).and_then(within),
            index.checked_add(1).and_then(within),
        ]
    }
}

/// Dimensions of a planar grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneConfig {
    /// Extent along x in world units.
    pub width: f32,
    /// Extent along z in world units.
    pub height: f32,
    /// Number of quads along x.
    pub width_segments: u32,
    /// Number of quads along z.
    pub height_segments: u32,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            width_segments: 100,
            height_segments: 100,
        }
    }
}

impl PlaneConfig {
    /// Vertices per row.
    pub fn row_width(&self) -> usize {
        self.width_segments as usize + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.row_width() * (self.height_segments as usize + 1)
    }
}

/// Owned planar height grid with per-vertex normals.
///
/// Only built through the constructors below, which keep `row_width >= 1`.
#[derive(Debug, Clone, Serialize)]
pub struct HeightGrid {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    row_width: usize,
    #[serde(skip)]
    needs_update: bool,
}

impl HeightGrid {
    /// Builds a flat grid centred on the origin in the xz plane.
    ///
    /// Rows run along +z; within a row, x increases.
    pub fn plane(config: &PlaneConfig) -> Self {
        let row_width = config.row_width();
        let rows = config.height_segments as usize + 1;
        let segment_w = config.width / config.width_segments.max(1) as f32;
        let segment_h = config.height / config.height_segments.max(1) as f32;
        let half_w = config.width / 2.0;
        let half_h = config.height / 2.0;

        let mut positions = Vec::with_capacity(row_width * rows);
        for iz in 0..rows {
            let z = iz as f32 * segment_h - half_h;
            for ix in 0..row_width {
                let x = ix as f32 * segment_w - half_w;
                positions.push(Vec3::new(x, 0.0, z));
            }
        }

        Self::from_positions(positions, row_width)
    }

    /// Builds a grid from explicit heights laid out row-major, with vertex `i`
    /// placed at `x = (i % row_width) * spacing`, `z = (i / row_width) * spacing`.
    pub fn from_heights(row_width: usize, heights: &[f32], spacing: f32) -> Self {
        let row_width = row_width.max(1);
        let positions = heights
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                let x = (i % row_width) as f32 * spacing;
                let z = (i / row_width) as f32 * spacing;
                Vec3::new(x, h, z)
            })
            .collect();

        Self::from_positions(positions, row_width)
    }

    /// Wraps existing positions. `row_width` is clamped to at least 1.
    pub fn from_positions(positions: Vec<Vec3>, row_width: usize) -> Self {
        let mut grid = Self {
            normals: vec![Vec3::Y; positions.len()],
            positions,
            row_width: row_width.max(1),
            needs_update: false,
        };
        grid.compute_vertex_normals();
        grid
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Heights of all vertices in index order.
    pub fn heights(&self) -> Vec<f32> {
        self.positions.iter().map(|p| p.y).collect()
    }

    /// Number of complete rows.
    pub fn rows(&self) -> usize {
        self.positions.len() / self.row_width
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the dirty flag and clears it.
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Minimum and maximum height. `(f32::MAX, f32::MIN)` for an empty grid.
    pub fn height_range(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;

        for p in &self.positions {
            min = min.min(p.y);
            max = max.max(p.y);
        }

        (min, max)
    }

    /// Sum of all heights, accumulated in f64.
    pub fn height_sum(&self) -> f64 {
        self.positions.iter().map(|p| p.y as f64).sum()
    }

    /// Recomputes per-vertex normals from the two triangles of each grid quad.
    ///
    /// Face normals are accumulated unnormalized (area weighted) and the sum is
    /// normalized per vertex. Vertices outside any complete quad keep +Y.
    pub fn compute_vertex_normals(&mut self) {
        let row = self.row_width;
        let rows = self.rows();
        let mut accum = vec![Vec3::ZERO; self.positions.len()];

        for iz in 0..rows.saturating_sub(1) {
            for ix in 0..row.saturating_sub(1) {
                let a = ix + row * iz;
                let b = ix + row * (iz + 1);
                let c = (ix + 1) + row * (iz + 1);
                let d = (ix + 1) + row * iz;

                for [i0, i1, i2] in [[a, b, d], [b, c, d]] {
                    let p0 = self.positions[i0];
                    let p1 = self.positions[i1];
                    let p2 = self.positions[i2];
                    let n = (p2 - p1).cross(p0 - p1);
                    accum[i0] += n;
                    accum[i1] += n;
                    accum[i2] += n;
                }
            }
        }

        for (normal, sum) in self.normals.iter_mut().zip(accum) {
            *normal = sum.try_normalize().unwrap_or(Vec3::Y);
        }
    }
}

impl HeightBuffer for HeightGrid {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn row_width(&self) -> usize {
        self.row_width
    }

    fn position(&self, index: usize) -> Vec3 {
        self.positions[index]
    }

    fn set_height(&mut self, index: usize, height: f32) {
        self.positions[index].y = height;
    }

    fn geometry_changed(&mut self) {
        self.compute_vertex_normals();
        self.needs_update = true;
    }
}
