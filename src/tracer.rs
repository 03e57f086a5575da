// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The Tracer is a render worker's private sampling machinery: its
//! random stream, its orbit scratch space and its density buffer.
//! It knows how to spend random trials on one region of the complex
//! plane; deciding *which* regions to visit belongs to the
//! decompositions in `strategy`.
//!
//! Most seed points are boring.  They either leave the radius at
//! once or never leave at all, and neither contributes much to the
//! picture.  The adaptive session therefore starts every region on a
//! small budget and raises it when it sees long escapes, and raises
//! it all the way when the region turns out to straddle the border
//! of the Mandelbrot set.

use std::cmp::{max, min};

use rand::Rng;

use crate::density::DensityBuffer;
use crate::orbit::{escape_time, Trajectory};
use crate::planes::{BoundingBox, PlaneMapper};
use crate::worker::WorkerStats;

/// Every adaptive session starts with this many trials.
pub const BASE_TRIALS: usize = 5;

/// The knobs shared by every sampling call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SamplingLimits {
    /// Maximum number of iterations per orbit.
    pub iterations: usize,
    /// Ceiling on the number of trials spent on one region.
    pub max_samples: usize,
}

/// The running trial budget of one adaptive session.
#[derive(Clone, Debug)]
pub struct TrialBudget {
    budget: usize,
    max_samples: usize,
    max_depth: Option<usize>,
    seen_escape: bool,
    seen_inside: bool,
}

impl TrialBudget {
    /// A fresh budget of [`BASE_TRIALS`] with nothing observed.
    pub fn new(max_samples: usize) -> Self {
        TrialBudget {
            budget: BASE_TRIALS,
            max_samples,
            max_depth: None,
            seen_escape: false,
            seen_inside: false,
        }
    }

    /// Number of trials the session currently intends to run.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Longest escape time seen so far.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// True once both an escaping and a non-escaping trial were seen.
    pub fn is_mixed(&self) -> bool {
        self.seen_escape && self.seen_inside
    }

    /// Fold one trial's escape time into the budget.  The budget
    /// never shrinks.
    pub fn observe(&mut self, escape_time: usize) {
        if self.max_depth.map_or(true, |d| escape_time > d) {
            self.max_depth = Some(escape_time);
            let wanted = escape_time
                .saturating_mul(escape_time)
                .saturating_mul(2)
                .saturating_add(BASE_TRIALS);
            self.budget = max(self.budget, min(self.max_samples, wanted));
        }

        if escape_time > 0 {
            self.seen_escape = true;
        } else {
            self.seen_inside = true;
        }

        // Mixed behaviour means the region touches the border of the
        // set, which is where all the structure is.
        if self.is_mixed() {
            self.budget = max(self.budget, self.max_samples);
        }
    }
}

/// What one region session did.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Session {
    /// Trials actually run.
    pub trials: usize,
    /// Trials whose orbit escaped.
    pub escapes: usize,
    /// Weight added per plotted orbit point.
    pub weight: f64,
    /// Orbit points that landed on the raster.
    pub plotted: usize,
    /// Whether both escaping and trapped seeds were seen.
    pub mixed: bool,
}

/// A worker's sampling state.  Owns its density buffer outright;
/// nothing in here is shared with any other worker.
pub struct Tracer<'a, R: Rng> {
    plane: &'a PlaneMapper,
    limits: SamplingLimits,
    rng: R,
    trajectory: Trajectory,
    // Buffer offsets hit by the current session, flushed once the
    // session's final weight is known.
    hits: Vec<usize>,
    buffer: DensityBuffer,
    stats: WorkerStats,
}

impl<'a, R: Rng> Tracer<'a, R> {
    /// A tracer drawing from `rng` and plotting into a fresh buffer
    /// the size of `plane`.
    pub fn new(plane: &'a PlaneMapper, limits: SamplingLimits, rng: R) -> Self {
        Tracer {
            plane,
            limits,
            rng,
            trajectory: Trajectory::new(limits.iterations),
            hits: Vec::new(),
            buffer: DensityBuffer::for_plane(plane),
            stats: WorkerStats::default(),
        }
    }

    /// The plane this tracer plots onto.
    pub fn plane(&self) -> &'a PlaneMapper {
        self.plane
    }

    /// The sampling limits in force.
    pub fn limits(&self) -> SamplingLimits {
        self.limits
    }

    /// The buffer accumulated so far.
    pub fn buffer(&self) -> &DensityBuffer {
        &self.buffer
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut WorkerStats {
        &mut self.stats
    }

    /// Give up the buffer and counters once rendering is over.
    pub fn finish(self) -> (DensityBuffer, WorkerStats) {
        (self.buffer, self.stats)
    }

    // One random trial.  Returns its escape time; on escape, the
    // orbit's raster offsets are queued for the next flush.
    fn trial(&mut self, bb: &BoundingBox, record: bool) -> usize {
        let c = bb.sample(&mut self.rng);
        let et = escape_time(c, self.limits.iterations, &mut self.trajectory);
        self.stats.trials += 1;
        if et > 0 {
            self.stats.escapes += 1;
            if record {
                let plane = self.plane;
                self.hits.extend(
                    self.trajectory
                        .points()
                        .iter()
                        .filter_map(|z| plane.point_to_offset(z)),
                );
            }
        }
        et
    }

    fn flush(&mut self, weight: f64) -> usize {
        let plotted = self.hits.len();
        for offset in self.hits.drain(..) {
            self.buffer.add(offset, weight);
        }
        plotted
    }

    /// Sample one region with the adaptive budget: start small, grow
    /// the budget quadratically with the longest escape seen, and go
    /// straight to the ceiling once the region shows mixed behaviour.
    /// Every escaping orbit is then plotted with weight 1/trials.
    pub fn sample_adaptive(&mut self, bb: &BoundingBox) -> Session {
        let mut budget = TrialBudget::new(self.limits.max_samples);
        let mut session = Session::default();
        while session.trials < budget.budget() {
            let et = self.trial(bb, true);
            session.trials += 1;
            if et > 0 {
                session.escapes += 1;
            }
            budget.observe(et);
        }
        session.mixed = budget.is_mixed();
        session.weight = 1.0 / session.trials as f64;
        session.plotted = self.flush(session.weight);
        self.stats.regions += 1;
        session
    }

    /// Sample one region with a fixed budget of `max_samples`
    /// trials, spreading `share` evenly over them.
    pub fn sample_fixed(&mut self, bb: &BoundingBox, share: f64) -> Session {
        let trials = self.limits.max_samples;
        let mut session = Session::default();
        let (mut inside, mut outside) = (false, false);
        for _ in 0..trials {
            if self.trial(bb, true) > 0 {
                session.escapes += 1;
                outside = true;
            } else {
                inside = true;
            }
        }
        session.trials = trials;
        session.mixed = inside && outside;
        session.weight = if trials == 0 { 0.0 } else { share / trials as f64 };
        session.plotted = self.flush(session.weight);
        self.stats.regions += 1;
        session
    }

    /// A cheap look at a region that plots nothing.  Runs a quarter
    /// of the usual trials and reports whether the region is worth
    /// subdividing: it straddles the border of the set, or some orbit
    /// outlived `depth` iterations.  Stops as soon as it knows.
    pub fn probe(&mut self, bb: &BoundingBox, depth: usize) -> bool {
        let trials = max(1, self.limits.max_samples / 4);
        let (mut inside, mut outside) = (false, false);
        for _ in 0..trials {
            let et = self.trial(bb, false);
            if et > 0 {
                outside = true;
            } else {
                inside = true;
            }
            if (inside && outside) || et > depth {
                return true;
            }
        }
        false
    }
}
