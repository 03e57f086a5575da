// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Where each worker's random stream comes from.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

/// How worker random streams are seeded.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SeedStrategy {
    /// Mix the wall clock, the worker index and the operating
    /// system's entropy source.  No two runs are alike.
    Entropy,
    /// Derive every worker's seed from a fixed base, so a run can be
    /// repeated exactly.
    Fixed(u64),
}

impl Default for SeedStrategy {
    fn default() -> Self {
        SeedStrategy::Entropy
    }
}

impl SeedStrategy {
    /// The seed for worker number `worker`.
    pub fn seed_for(&self, worker: usize) -> u64 {
        match *self {
            SeedStrategy::Entropy => {
                let clock = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0);
                clock
                    .wrapping_add(worker as u64)
                    .wrapping_add(OsRng.next_u64())
            }
            SeedStrategy::Fixed(base) => base.wrapping_add(worker as u64),
        }
    }

    /// A freshly seeded generator for worker number `worker`.
    pub fn rng_for(&self, worker: usize) -> StdRng {
        StdRng::seed_from_u64(self.seed_for(worker))
    }
}
