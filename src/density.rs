// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The accumulation grid.  Each render worker owns one of these for
//! the whole run; they only meet again inside the compositor.

use num::Complex;

use crate::planes::PlaneMapper;

/// A row-major grid of accumulated orbit weights, one cell per
/// output pixel.  Cells only ever grow.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityBuffer {
    rows: usize,
    columns: usize,
    cells: Vec<f64>,
}

impl DensityBuffer {
    /// An all-zero buffer of the given shape.
    pub fn new(rows: usize, columns: usize) -> Self {
        DensityBuffer {
            rows,
            columns,
            cells: vec![0.0; rows * columns],
        }
    }

    /// A buffer shaped to match the raster of `plane`.
    pub fn for_plane(plane: &PlaneMapper) -> Self {
        DensityBuffer::new(plane.rows, plane.columns)
    }

    /// Build a buffer from existing row-major data.  Returns `None`
    /// if the data does not fit the shape or holds a negative value.
    pub fn from_cells(rows: usize, columns: usize, cells: Vec<f64>) -> Option<Self> {
        if cells.len() != rows * columns || cells.iter().any(|c| !(*c >= 0.0)) {
            return None;
        }
        Some(DensityBuffer {
            rows,
            columns,
            cells,
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True for a zero-sized buffer.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The value at a row and column.
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.cells[row * self.columns + column]
    }

    /// The raw row-major cells.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Add `weight` to the cell at `offset`.
    #[inline]
    pub fn add(&mut self, offset: usize, weight: f64) {
        debug_assert!(weight >= 0.0);
        self.cells[offset] += weight;
    }

    /// Add `weight` to every cell an orbit passes through.  Points
    /// that fall outside the raster contribute nothing.
    pub fn plot(&mut self, plane: &PlaneMapper, orbit: &[Complex<f64>], weight: f64) {
        for z in orbit {
            if let Some(offset) = plane.point_to_offset(z) {
                self.add(offset, weight);
            }
        }
    }

    /// Sum of every cell.
    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }
}
