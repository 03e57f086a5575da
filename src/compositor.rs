// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Assemble all of the worker planes into a single plane and turn it
//! into pixels.
//!
//! A handful of cells collect orders of magnitude more weight than
//! the rest, so the merged buffer is squeezed through a square-root
//! curve before it is scaled to sixteen bits.

use std::path::Path;

use image::{ImageBuffer, Luma};
use itertools::{iproduct, Itertools, MinMaxResult};
use log::info;

use crate::density::DensityBuffer;
use crate::error::{BuddhaError, Result};

/// Largest sample value in the output raster.
pub const MAX_SAMPLE: f64 = 65535.0;

/// What the tone curve treats as black.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Floor {
    /// The smallest value in the merged buffer.
    Minimum,
    /// Zero, whatever the buffer holds.
    Zero,
}

impl Default for Floor {
    fn default() -> Self {
        Floor::Minimum
    }
}

/// The normalisation range of a merged buffer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Range {
    /// Value mapped to black.
    pub min: f64,
    /// Value mapped to white.
    pub max: f64,
}

/// The finished image and the range it was normalised over.
#[derive(Debug, Clone)]
pub struct Composite {
    /// Row-major sixteen-bit samples, one per pixel.
    pub pixels: Vec<u16>,
    /// Rows in the image.
    pub rows: usize,
    /// Columns in the image.
    pub columns: usize,
    /// Normalisation range; `None` for an empty buffer.
    pub range: Option<Range>,
}

/// Merges worker buffers and tone-maps the result.
#[derive(Copy, Clone, Debug, Default)]
pub struct Compositor {
    /// Fold each pixel's mirror image across the middle column into
    /// it.  The map is symmetric under conjugation, so this doubles
    /// the sample count for nothing.
    pub mirror: bool,
    /// Where black sits.
    pub floor: Floor,
}

impl Compositor {
    /// A compositor with the given settings.
    pub fn new(mirror: bool, floor: Floor) -> Self {
        Compositor { mirror, floor }
    }

    /// Sum every buffer cell by cell, folding in the mirrored column
    /// when asked to.
    pub fn merge(&self, buffers: &[DensityBuffer]) -> Result<DensityBuffer> {
        let first = buffers
            .first()
            .ok_or_else(|| BuddhaError::InvalidConfig("No buffers to merge".to_string()))?;
        let (rows, columns) = (first.rows(), first.columns());
        if buffers
            .iter()
            .any(|b| b.rows() != rows || b.columns() != columns)
        {
            return Err(BuddhaError::InvalidPlane(
                "Worker buffers differ in shape".to_string(),
            ));
        }

        let mut sum = vec![0.0; rows * columns];
        for buffer in buffers {
            for (total, cell) in sum.iter_mut().zip(buffer.cells()) {
                *total += cell;
            }
        }

        let cells = if self.mirror {
            iproduct!(0..rows, 0..columns)
                .map(|(r, c)| sum[r * columns + c] + sum[r * columns + (columns - 1 - c)])
                .collect()
        } else {
            sum
        };

        DensityBuffer::from_cells(rows, columns, cells).ok_or_else(|| {
            BuddhaError::InvalidPlane("Merged buffer holds negative density".to_string())
        })
    }

    /// The range the tone curve will stretch over.
    pub fn range(&self, buffer: &DensityBuffer) -> Option<Range> {
        let (min, max) = match buffer.cells().iter().minmax() {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(v) => (*v, *v),
            MinMaxResult::MinMax(lo, hi) => (*lo, *hi),
        };
        match self.floor {
            Floor::Minimum => Some(Range { min, max }),
            Floor::Zero => Some(Range { min: 0.0, max }),
        }
    }

    /// Apply the square-root curve, scaled to sixteen bits.  A buffer
    /// with no spread at all (max equal to min, such as an empty
    /// render) comes out black.
    pub fn tone_map(&self, buffer: &DensityBuffer, range: Option<Range>) -> Vec<u16> {
        match range {
            Some(Range { min, max }) if max > min => {
                let spread = max - min;
                buffer
                    .cells()
                    .iter()
                    .map(|v| {
                        let level = ((v - min) / spread).max(0.0).sqrt() * MAX_SAMPLE;
                        num::clamp(level, 0.0, MAX_SAMPLE) as u16
                    })
                    .collect()
            }
            _ => vec![0; buffer.len()],
        }
    }

    /// Merge, measure and tone-map in one go.
    pub fn composite(&self, buffers: &[DensityBuffer]) -> Result<Composite> {
        let merged = self.merge(buffers)?;
        let range = self.range(&merged);
        if let Some(r) = range {
            info!(
                "merged {} buffers: density range {:.6} to {:.6}",
                buffers.len(),
                r.min,
                r.max
            );
        }
        Ok(Composite {
            pixels: self.tone_map(&merged, range),
            rows: merged.rows(),
            columns: merged.columns(),
            range,
        })
    }
}

/// Write a composite as a sixteen-bit grayscale PNG.
pub fn write_png16<P: AsRef<Path>>(path: P, composite: &Composite) -> Result<()> {
    let image: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_raw(
        composite.columns as u32,
        composite.rows as u32,
        composite.pixels.clone(),
    )
    .ok_or_else(|| BuddhaError::Image("Pixel data does not fit the image".to_string()))?;
    image.save(path.as_ref())?;
    info!("wrote {}", path.as_ref().display());
    Ok(())
}
