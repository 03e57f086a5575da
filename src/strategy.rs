// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Two ways of carving the complex plane into regions for the
//! tracer to sample.
//!
//! The `Grid` walks the output raster pixel by pixel and lets the
//! adaptive session decide how hard to look at each pixel's
//! preimage.  The `Quadtree` starts from the whole window and keeps
//! quartering the regions that look interesting, so the boring
//! parts of the plane are covered by a few big boxes and the border
//! of the set by many small ones.
//!
//! Both are driven the same way by the render workers, and both
//! split work between workers with the same stride and offset.

use std::fmt;
use std::str::FromStr;

use log::trace;
use rand::Rng;

use crate::planes::{BoundingBox, Pixel};
use crate::tracer::Tracer;
use crate::worker::Partition;

/// Smallest box side the quadtree will subdivide.
pub const MIN_CELL_SIZE: f64 = 1e-5;

/// Largest depth counter the quadtree will reach.  The counter
/// doubles at every level.
pub const MAX_DEPTH: usize = 1024;

/// A way of visiting the plane.  Implementations decide which
/// regions a worker samples; the tracer decides how.
pub trait Decomposition: Sync {
    /// Render this worker's share of the plane.
    fn render<R: Rng>(&self, tracer: &mut Tracer<'_, R>, partition: Partition);
}

/// Selects a decomposition by name.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Strategy {
    /// Strided rows of pixels, adaptively sampled.
    Grid,
    /// Recursive quadrant subdivision.
    Quadtree,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Grid
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::Grid => write!(f, "grid"),
            Strategy::Quadtree => write!(f, "quadtree"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Strategy::Grid),
            "quadtree" => Ok(Strategy::Quadtree),
            _ => Err(format!("Unknown strategy '{}'; expected grid or quadtree", s)),
        }
    }
}

/// Every pixel of every row this worker owns gets one adaptive
/// session over its preimage box.
#[derive(Copy, Clone, Debug, Default)]
pub struct Grid;

impl Decomposition for Grid {
    fn render<R: Rng>(&self, tracer: &mut Tracer<'_, R>, partition: Partition) {
        let plane = tracer.plane();
        for row in partition.rows(plane.rows) {
            for column in 0..plane.columns {
                let bb = plane.pixel_box(&Pixel::new(row, column));
                tracer.sample_adaptive(&bb);
            }
        }
    }
}

/// Decides whether a quadtree region deserves subdividing.
pub trait Probe: Sync {
    /// True if `bb`, at depth counter `depth`, should be split.
    fn is_interesting<R: Rng>(
        &self,
        tracer: &mut Tracer<'_, R>,
        bb: &BoundingBox,
        depth: usize,
    ) -> bool;
}

/// The standard probe: a quarter-budget look at the region that
/// plots nothing.  See [`Tracer::probe`].
#[derive(Copy, Clone, Debug, Default)]
pub struct EscapeProbe;

impl Probe for EscapeProbe {
    fn is_interesting<R: Rng>(
        &self,
        tracer: &mut Tracer<'_, R>,
        bb: &BoundingBox,
        depth: usize,
    ) -> bool {
        tracer.probe(bb, depth)
    }
}

/// Recursive quadrant subdivision of the plane window.
///
/// The root region carries the whole pixel count as its weight.
/// Every split hands each child a quarter of the parent's weight and
/// doubles the depth counter, so regions have to keep producing
/// ever longer escapes to be split again.  A region that is too
/// small, too deep, or judged boring by the probe is sampled once at
/// the full trial budget with its weight share; boring regions are
/// never skipped outright.
///
/// With several workers the top levels are split unconditionally
/// until there is at least one subtree per worker, and the probe only
/// starts below that.  The leaf layout therefore depends on the
/// worker count; the expected density does not.
#[derive(Clone, Debug)]
pub struct Quadtree<P: Probe = EscapeProbe> {
    min_cell_size: f64,
    max_depth: usize,
    probe: P,
}

impl Default for Quadtree {
    fn default() -> Self {
        Quadtree::new(MIN_CELL_SIZE, MAX_DEPTH)
    }
}

impl Quadtree {
    /// A quadtree with the standard probe.
    pub fn new(min_cell_size: f64, max_depth: usize) -> Self {
        Quadtree::with_probe(min_cell_size, max_depth, EscapeProbe)
    }
}

impl<P: Probe> Quadtree<P> {
    /// A quadtree deciding splits with a custom probe.
    pub fn with_probe(min_cell_size: f64, max_depth: usize, probe: P) -> Self {
        Quadtree {
            min_cell_size,
            max_depth,
            probe,
        }
    }

    /// Whether a region may be split at all, whatever the probe says.
    pub fn can_split(&self, bb: &BoundingBox, depth: usize) -> bool {
        bb.side() >= self.min_cell_size
            && depth
                .checked_mul(2)
                .map_or(false, |next| next <= self.max_depth)
    }

    // Force-split down to the level where there are at least as many
    // nodes as workers, then hand each node to exactly one worker.
    #[allow(clippy::too_many_arguments)]
    fn distribute<R: Rng>(
        &self,
        tracer: &mut Tracer<'_, R>,
        partition: Partition,
        bb: &BoundingBox,
        weight: f64,
        depth: usize,
        nodes: usize,
        index: usize,
    ) {
        if nodes < partition.stride && self.can_split(bb, depth) {
            for (q, quad) in bb.quadrants().iter().enumerate() {
                self.distribute(
                    tracer,
                    partition,
                    quad,
                    weight / 4.0,
                    depth * 2,
                    nodes * 4,
                    index * 4 + q,
                );
            }
        } else if partition.owns(index) {
            self.subdivide(tracer, bb, weight, depth);
        }
    }

    fn subdivide<R: Rng>(
        &self,
        tracer: &mut Tracer<'_, R>,
        bb: &BoundingBox,
        weight: f64,
        depth: usize,
    ) {
        {
            let stats = tracer.stats_mut();
            stats.deepest = stats.deepest.max(depth);
        }

        if !self.can_split(bb, depth) || !self.probe.is_interesting(tracer, bb, depth) {
            trace!(
                "quadtree leaf [{}, {}]x[{}, {}] depth {}",
                bb.ulo,
                bb.uhi,
                bb.vlo,
                bb.vhi,
                depth
            );
            tracer.sample_fixed(bb, weight);
            tracer.stats_mut().leaves += 1;
            return;
        }

        for quad in bb.quadrants().iter() {
            self.subdivide(tracer, quad, weight / 4.0, depth * 2);
        }
    }
}

impl<P: Probe> Decomposition for Quadtree<P> {
    fn render<R: Rng>(&self, tracer: &mut Tracer<'_, R>, partition: Partition) {
        let plane = tracer.plane();
        self.distribute(tracer, partition, &plane.window, plane.len() as f64, 1, 1, 0);
    }
}
