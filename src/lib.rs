#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Buddhabrot renderer
//!
//! The Buddhabrot is a variant of the Mandelbrot set.  Where the
//! Mandelbrot colours each seed point by how quickly its orbit under
//! z <- z² + c runs off to infinity, the Buddhabrot plots the orbits
//! themselves: every escaping orbit increments each pixel it passes
//! through, and the accumulated density becomes the image.
//!
//! Picking seed points uniformly wastes almost all of the work, since
//! most orbits either leave at once or never leave.  This renderer
//! spends its trials where they matter.  The plane is carved into
//! regions (one per pixel in the `Grid` decomposition, variable-sized
//! boxes in the `Quadtree`), and each region gets more trials the
//! longer its orbits survive, and the most trials of all when it
//! straddles the border of the set.
//!
//! Rendering is split across workers that each own a private density
//! buffer and random stream.  Once every worker has finished, the
//! `Compositor` merges the buffers, optionally folds in the mirror
//! image, and tone-maps the result to sixteen-bit grayscale.

pub mod compositor;
pub mod config;
pub mod density;
pub mod error;
pub mod orbit;
pub mod palette;
pub mod planes;
pub mod seed;
pub mod strategy;
pub mod tracer;
pub mod worker;

pub use crate::compositor::{write_png16, Composite, Compositor, Floor};
pub use crate::config::{render, render_buffers, RenderConfig, Rendering};
pub use crate::density::DensityBuffer;
pub use crate::error::{BuddhaError, Result};
pub use crate::planes::{BoundingBox, Pixel, PlaneMapper};
pub use crate::seed::SeedStrategy;
pub use crate::strategy::{Decomposition, Grid, Quadtree, Strategy};
