// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Render parameters, their validation, and the entry point that
//! turns them into an image.

use log::{info, warn};
use num::Complex;

use crate::compositor::{Composite, Compositor, Floor};
use crate::error::{BuddhaError, Result};
use crate::planes::PlaneMapper;
use crate::seed::SeedStrategy;
use crate::strategy::{Grid, Quadtree, Strategy, MAX_DEPTH, MIN_CELL_SIZE};
use crate::tracer::SamplingLimits;
use crate::worker::{make_workers, run_workers, WorkerOutput, WorkerStats};

/// Everything needed to describe one render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Width and height of the output image in pixels.
    pub image_size: usize,
    /// Maximum number of iterations per orbit.
    pub iterations: usize,
    /// Number of render workers.
    pub threads: usize,
    /// Ceiling on the trials spent on one region.
    pub max_samples: usize,
    /// How the plane is carved into regions.
    pub strategy: Strategy,
    /// Fold in the mirror image across the real axis.
    pub mirror: bool,
    /// What the tone curve treats as black.
    pub floor: Floor,
    /// Where worker random streams come from.
    pub seed: SeedStrategy,
    /// Smallest quadtree box that may still be split.
    pub min_cell_size: f64,
    /// Largest quadtree depth counter.
    pub max_depth: usize,
    /// Left-lower corner of the complex window.
    pub leftlower: Complex<f64>,
    /// Right-upper corner of the complex window.
    pub rightupper: Complex<f64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            image_size: 1024,
            iterations: 1000,
            threads: num_cpus::get(),
            max_samples: 48,
            strategy: Strategy::Grid,
            mirror: true,
            floor: Floor::Minimum,
            seed: SeedStrategy::Entropy,
            min_cell_size: MIN_CELL_SIZE,
            max_depth: MAX_DEPTH,
            leftlower: Complex::new(-2.0, -2.0),
            rightupper: Complex::new(2.0, 2.0),
        }
    }
}

impl RenderConfig {
    /// Reject parameters that cannot produce a meaningful render.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(BuddhaError::InvalidConfig(msg.to_string()));
        if self.image_size == 0 {
            return fail("image size must be at least 1");
        }
        if self.iterations == 0 {
            return fail("iteration cap must be at least 1");
        }
        if self.threads == 0 {
            return fail("thread count must be at least 1");
        }
        if self.max_samples == 0 {
            return fail("trial ceiling must be at least 1");
        }
        if !(self.min_cell_size > 0.0) {
            return fail("minimum cell size must be positive");
        }
        if self.max_depth == 0 {
            return fail("depth cap must be at least 1");
        }
        // The mirror folds column c onto columns-1-c, which is the
        // complex conjugate only when the window straddles the real
        // axis evenly.
        if self.mirror && self.leftlower.im != -self.rightupper.im {
            return fail("mirroring needs a window symmetric about the real axis");
        }
        Ok(())
    }

    /// The mapping between the output raster and the complex window.
    pub fn plane(&self) -> Result<PlaneMapper> {
        PlaneMapper::new(self.image_size, self.image_size, self.leftlower, self.rightupper)
    }

    /// Iteration cap and trial ceiling.
    pub fn limits(&self) -> SamplingLimits {
        SamplingLimits {
            iterations: self.iterations,
            max_samples: self.max_samples,
        }
    }

    /// The compositor matching these settings.
    pub fn compositor(&self) -> Compositor {
        Compositor::new(self.mirror, self.floor)
    }

    /// The default name of the output file.
    pub fn file_name(&self) -> String {
        format!(
            "buddhabrot_{}_{}_{}_{}.png",
            self.image_size, self.iterations, self.max_samples, self.strategy
        )
    }
}

/// A finished render: the image plus what it cost.
#[derive(Debug, Clone)]
pub struct Rendering {
    /// The tone-mapped image.
    pub composite: Composite,
    /// Counters summed over all workers.
    pub stats: WorkerStats,
}

/// Run every worker to completion; the buffers are left unmerged.
pub fn render_buffers(config: &RenderConfig) -> Result<WorkerOutput> {
    config.validate()?;
    let plane = config.plane()?;
    if config.threads > num_cpus::get() {
        warn!(
            "{} threads requested on {} logical cpus",
            config.threads,
            num_cpus::get()
        );
    }
    info!(
        "rendering {0}x{0}, {1} iterations, {2} trials per region, {3} strategy",
        config.image_size, config.iterations, config.max_samples, config.strategy
    );

    let workers = make_workers(config.threads, config.limits(), config.seed);
    match config.strategy {
        Strategy::Grid => run_workers(&plane, &Grid, &workers),
        Strategy::Quadtree => run_workers(
            &plane,
            &Quadtree::new(config.min_cell_size, config.max_depth),
            &workers,
        ),
    }
}

/// Render a Buddhabrot from `config` all the way to pixels.
pub fn render(config: &RenderConfig) -> Result<Rendering> {
    let output = render_buffers(config)?;
    let stats = output.total();
    info!(
        "{} regions, {} trials, {} escapes",
        stats.regions, stats.trials, stats.escapes
    );
    let composite = config.compositor().composite(&output.buffers)?;
    Ok(Rendering { composite, stats })
}
