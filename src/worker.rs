// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Render workers and the coordinator that runs them.
//!
//! Each worker owns a full-size density buffer and its own random
//! stream, and visits its own share of the plane.  Workers never talk
//! to each other; the only synchronisation in a run is the join at
//! the end of the crossbeam scope.  Only after every worker is done
//! does the compositor get to see the buffers.

use std::iter::StepBy;
use std::ops::{AddAssign, Range};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::density::DensityBuffer;
use crate::error::{BuddhaError, Result};
use crate::planes::PlaneMapper;
use crate::seed::SeedStrategy;
use crate::strategy::Decomposition;
use crate::tracer::{SamplingLimits, Tracer};

/// Which share of the plane a worker renders: every `stride`th unit
/// of work, starting at `offset`.  For the grid the units are rows;
/// for the quadtree they are the subtrees at the level where the
/// plane is first split into at least `stride` pieces.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Partition {
    /// First unit owned.
    pub offset: usize,
    /// Distance between owned units; the number of workers.
    pub stride: usize,
}

impl Partition {
    /// Worker `offset` of `stride`.
    pub fn new(offset: usize, stride: usize) -> Self {
        debug_assert!(stride > 0 && offset < stride);
        Partition { offset, stride }
    }

    /// The whole plane, for a lone worker.
    pub fn whole() -> Self {
        Partition::new(0, 1)
    }

    /// True if unit `index` belongs to this worker.
    pub fn owns(&self, index: usize) -> bool {
        index % self.stride == self.offset
    }

    /// The rows this worker owns out of `total`.
    pub fn rows(&self, total: usize) -> StepBy<Range<usize>> {
        (self.offset..total).step_by(self.stride)
    }
}

/// Counters a worker keeps while rendering.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WorkerStats {
    /// Regions sampled, probes excluded.
    pub regions: u64,
    /// Random trials run, probes included.
    pub trials: u64,
    /// Trials whose orbit escaped.
    pub escapes: u64,
    /// Quadtree regions sampled at the full budget.
    pub leaves: u64,
    /// Largest quadtree depth counter reached.
    pub deepest: usize,
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: WorkerStats) {
        self.regions += other.regions;
        self.trials += other.trials;
        self.escapes += other.escapes;
        self.leaves += other.leaves;
        self.deepest = self.deepest.max(other.deepest);
    }
}

/// Everything one worker needs before it starts.
#[derive(Copy, Clone, Debug)]
pub struct RenderWorker {
    /// Position among the workers.
    pub index: usize,
    /// The worker's share of the plane.
    pub partition: Partition,
    /// Seed for the worker's private random stream.
    pub seed: u64,
    /// Iteration cap and trial ceiling.
    pub limits: SamplingLimits,
}

impl RenderWorker {
    /// Render this worker's share of `plane` and return the buffer.
    pub fn run<D: Decomposition>(
        &self,
        plane: &PlaneMapper,
        decomposition: &D,
    ) -> (DensityBuffer, WorkerStats) {
        debug!(
            "worker {}: seed {:#018x}, partition {:?}",
            self.index, self.seed, self.partition
        );
        let mut tracer = Tracer::new(plane, self.limits, StdRng::seed_from_u64(self.seed));
        decomposition.render(&mut tracer, self.partition);
        let (buffer, stats) = tracer.finish();
        info!(
            "worker {} done: {} regions, {} trials, {} escapes",
            self.index, stats.regions, stats.trials, stats.escapes
        );
        (buffer, stats)
    }
}

/// The buffers and counters of a finished run, in worker order.
#[derive(Debug)]
pub struct WorkerOutput {
    /// One density buffer per worker.
    pub buffers: Vec<DensityBuffer>,
    /// One set of counters per worker.
    pub stats: Vec<WorkerStats>,
}

impl WorkerOutput {
    /// Counters summed over every worker.
    pub fn total(&self) -> WorkerStats {
        let mut total = WorkerStats::default();
        for s in &self.stats {
            total += *s;
        }
        total
    }
}

/// Build `threads` workers with disjoint partitions and seeds drawn
/// from `seeds`.
pub fn make_workers(
    threads: usize,
    limits: SamplingLimits,
    seeds: SeedStrategy,
) -> Vec<RenderWorker> {
    (0..threads)
        .map(|index| RenderWorker {
            index,
            partition: Partition::new(index, threads),
            seed: seeds.seed_for(index),
            limits,
        })
        .collect()
}

/// Run every worker on its own thread and wait for all of them.  A
/// panic in any worker fails the whole run.
pub fn run_workers<D: Decomposition>(
    plane: &PlaneMapper,
    decomposition: &D,
    workers: &[RenderWorker],
) -> Result<WorkerOutput> {
    info!("starting {} render workers", workers.len());
    let results = crossbeam::scope(|spawner| {
        let handles: Vec<_> = workers
            .iter()
            .map(|worker| spawner.spawn(move |_| worker.run(plane, decomposition)))
            .collect();

        // Join every handle before looking at any result.
        handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
    })
    .map_err(|_| BuddhaError::WorkerPanicked("render scope".to_string()))?;

    let results = results
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.map_err(|_| BuddhaError::WorkerPanicked(format!("worker {}", i))))
        .collect::<Result<Vec<_>>>()?;
    let (buffers, stats) = results.into_iter().unzip();
    Ok(WorkerOutput { buffers, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{Grid, Quadtree};
    use rand::Rng;

    const LIMITS: SamplingLimits = SamplingLimits {
        iterations: 50,
        max_samples: 20,
    };

    #[test]
    fn partitions_cover_every_row_once() {
        let mut seen = vec![0; 10];
        for offset in 0..3 {
            for row in Partition::new(offset, 3).rows(10) {
                seen[row] += 1;
            }
        }
        assert!(seen.iter().all(|s| *s == 1));
    }

    #[test]
    fn ownership_matches_rows() {
        let p = Partition::new(2, 4);
        let rows: Vec<usize> = p.rows(12).collect();
        assert_eq!(rows, vec![2, 6, 10]);
        assert!(rows.iter().all(|r| p.owns(*r)));
        assert!(!p.owns(3));
    }

    #[test]
    fn stats_add_up() {
        let mut a = WorkerStats {
            regions: 1,
            trials: 10,
            escapes: 4,
            leaves: 0,
            deepest: 8,
        };
        a += WorkerStats {
            regions: 2,
            trials: 5,
            escapes: 1,
            leaves: 3,
            deepest: 2,
        };
        assert_eq!(a.regions, 3);
        assert_eq!(a.trials, 15);
        assert_eq!(a.escapes, 5);
        assert_eq!(a.leaves, 3);
        assert_eq!(a.deepest, 8);
    }

    #[test]
    fn workers_get_distinct_seeds_and_partitions() {
        let workers = make_workers(4, LIMITS, SeedStrategy::Fixed(10));
        assert_eq!(workers.len(), 4);
        for (i, w) in workers.iter().enumerate() {
            assert_eq!(w.partition, Partition::new(i, 4));
            assert_eq!(w.seed, 10 + i as u64);
        }
    }

    #[test]
    fn grid_workers_sample_every_pixel_once() {
        let plane = PlaneMapper::square(12).unwrap();
        let workers = make_workers(3, LIMITS, SeedStrategy::Fixed(1));
        let output = run_workers(&plane, &Grid, &workers).unwrap();
        assert_eq!(output.buffers.len(), 3);
        assert_eq!(output.total().regions, 144);
        for (buffer, stats) in output.buffers.iter().zip(output.stats.iter()) {
            assert_eq!(stats.regions, 48);
            assert_eq!(buffer.len(), 144);
            assert!(buffer.cells().iter().all(|c| *c >= 0.0));
        }
    }

    #[test]
    fn runs_repeat_with_fixed_seeds() {
        let plane = PlaneMapper::square(8).unwrap();
        let workers = make_workers(2, LIMITS, SeedStrategy::Fixed(77));
        let a = run_workers(&plane, &Quadtree::new(0.1, 64), &workers).unwrap();
        let b = run_workers(&plane, &Quadtree::new(0.1, 64), &workers).unwrap();
        assert_eq!(a.buffers, b.buffers);
        assert_eq!(a.stats, b.stats);
    }

    struct Exploding;

    impl Decomposition for Exploding {
        fn render<R: Rng>(&self, _: &mut Tracer<'_, R>, partition: Partition) {
            if partition.offset == 1 {
                panic!("worker down");
            }
        }
    }

    #[test]
    fn a_panicking_worker_fails_the_run() {
        let plane = PlaneMapper::square(4).unwrap();
        let workers = make_workers(2, LIMITS, SeedStrategy::Fixed(0));
        match run_workers(&plane, &Exploding, &workers) {
            Err(BuddhaError::WorkerPanicked(who)) => assert_eq!(who, "worker 1"),
            other => panic!("unexpected result {:?}", other.map(|o| o.stats)),
        }
    }
}
