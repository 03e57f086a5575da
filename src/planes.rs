// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners defining the leftlower and rightupper corners of the
//! complex plane.
//!
//! Rows follow the real axis and columns follow the imaginary axis.
//! The quadratic map is symmetric under conjugation, so with this
//! layout the Buddhabrot is symmetric about the middle column.

use num::Complex;
use rand::Rng;

use crate::error::{BuddhaError, Result};

/// Describes the row and column of a pixel in the output raster.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel {
    /// Index along the real axis.
    pub row: usize,
    /// Index along the imaginary axis.
    pub column: usize,
}

impl Pixel {
    /// Shorthand constructor.
    pub fn new(row: usize, column: usize) -> Self {
        Pixel { row, column }
    }
}

/// A rectangle on the complex plane.  `u` runs along the real axis
/// and `v` along the imaginary axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    /// Lowest real value.
    pub ulo: f64,
    /// Highest real value.
    pub uhi: f64,
    /// Lowest imaginary value.
    pub vlo: f64,
    /// Highest imaginary value.
    pub vhi: f64,
}

impl BoundingBox {
    /// Build a box from its four edges.
    pub fn new(ulo: f64, uhi: f64, vlo: f64, vhi: f64) -> Self {
        BoundingBox { ulo, uhi, vlo, vhi }
    }

    /// Length of the box along the real axis.  The quadtree only ever
    /// produces squares from a square window, so this doubles as the
    /// side length.
    pub fn side(&self) -> f64 {
        self.uhi - self.ulo
    }

    /// Draw a point uniformly at random from inside the box.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Complex<f64> {
        let u: f64 = rng.gen();
        let v: f64 = rng.gen();
        Complex::new(
            self.ulo + (self.uhi - self.ulo) * u,
            self.vlo + (self.vhi - self.vlo) * v,
        )
    }

    /// Split the box into four equal quarters.
    pub fn quadrants(&self) -> [BoundingBox; 4] {
        let umid = (self.ulo + self.uhi) / 2.0;
        let vmid = (self.vlo + self.vhi) / 2.0;
        [
            BoundingBox::new(umid, self.uhi, vmid, self.vhi),
            BoundingBox::new(umid, self.uhi, self.vlo, vmid),
            BoundingBox::new(self.ulo, umid, vmid, self.vhi),
            BoundingBox::new(self.ulo, umid, self.vlo, vmid),
        ]
    }
}

/// Contains the definitions of two planes: an integral cartesian
/// plane, and a complex cartesian plane.  Maps points from one to
/// the other.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    /// Rows of the integral plane.
    pub rows: usize,
    /// Columns of the integral plane.
    pub columns: usize,
    /// The complex window, left-lower and right-upper.
    pub window: BoundingBox,
    // Pixels per unit along the real and imaginary axes.
    grid_factors: (f64, f64),
}

impl PlaneMapper {
    /// Takes the raster shape and the two corners describing the
    /// complex plane.
    pub fn new(
        rows: usize,
        columns: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
    ) -> Result<PlaneMapper> {
        if rows == 0 || columns == 0 {
            return Err(BuddhaError::InvalidPlane(
                "The integral plane has no pixels.".to_string(),
            ));
        }

        if rightupper.re <= leftlower.re {
            return Err(BuddhaError::InvalidPlane(
                "The left lower corner is not to the left of the right upper corner.".to_string(),
            ));
        }

        if rightupper.im <= leftlower.im {
            return Err(BuddhaError::InvalidPlane(
                "The left lower corner is not lower than the right upper corner.".to_string(),
            ));
        }

        let grid_factors = (
            (rows as f64) / (rightupper.re - leftlower.re),
            (columns as f64) / (rightupper.im - leftlower.im),
        );

        Ok(PlaneMapper {
            rows,
            columns,
            window: BoundingBox::new(leftlower.re, rightupper.re, leftlower.im, rightupper.im),
            grid_factors,
        })
    }

    /// A square raster over the standard [-2,2]x[-2,2] window.
    pub fn square(size: usize) -> Result<PlaneMapper> {
        PlaneMapper::new(size, size, Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0))
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.rows * self.columns
    }

    /// True when the integral plane has no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Given a point on the complex plane, find the pixel it lands
    /// in, or `None` if it falls outside the raster.
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        let row = (point.re - self.window.ulo) * self.grid_factors.0;
        let column = (point.im - self.window.vlo) * self.grid_factors.1;
        // Written so that NaN coordinates are rejected too.
        if !(row >= 0.0 && row < self.rows as f64 && column >= 0.0 && column < self.columns as f64)
        {
            return None;
        }
        Some(Pixel::new(row as usize, column as usize))
    }

    /// Given a pixel, return the complex point at its lower corner.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            (pixel.row as f64) / self.grid_factors.0 + self.window.ulo,
            (pixel.column as f64) / self.grid_factors.1 + self.window.vlo,
        )
    }

    /// The region of the complex plane that maps onto one pixel.
    pub fn pixel_box(&self, pixel: &Pixel) -> BoundingBox {
        let lo = self.pixel_to_point(pixel);
        let hi = self.pixel_to_point(&Pixel::new(pixel.row + 1, pixel.column + 1));
        BoundingBox::new(lo.re, hi.re, lo.im, hi.im)
    }

    /// Maps a point straight to its row-major offset in a buffer the
    /// size of the raster.  Orbits use this to decide which cell to
    /// increment as they pass through.
    pub fn point_to_offset(&self, point: &Complex<f64>) -> Option<usize> {
        self.point_to_pixel(point)
            .map(|p| p.row * self.columns + p.column)
    }
}
