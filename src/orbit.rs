// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time iterator.  Every sample the renderer takes comes
//! through here: iterate z <- z² + c from zero, remember where the
//! orbit went, and report how long it took to leave.

use num::Complex;

/// Squared magnitude past which an orbit is considered to have
/// escaped.  Larger than the textbook 4.0 so that orbits linger a
/// little longer in the outer halo of the image.
pub const ESCAPE_RADIUS_SQR: f64 = 8.0;

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// The orbit of one seed point, reused from trial to trial so that
/// the hot loop never allocates.
#[derive(Debug, Clone)]
pub struct Trajectory {
    points: Vec<Complex<f64>>,
}

impl Trajectory {
    /// A trajectory buffer able to hold `limit` points without
    /// growing.
    pub fn new(limit: usize) -> Self {
        Trajectory {
            points: Vec::with_capacity(limit),
        }
    }

    /// The points recorded by the most recent run.  After an escape
    /// this is every iterate before the one that left the radius.
    pub fn points(&self) -> &[Complex<f64>] {
        &self.points
    }

    /// Number of points recorded by the most recent run.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the last run recorded nothing.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The two halves of the `&&` expression are false if the point
/// lies inside the main cardioid or the period-2 bulb, both of which
/// are known never to escape.  A `true` result says nothing.
pub fn maybe_outside(c: Complex<f64>) -> bool {
    let y = c.im * c.im;
    let q = y + (c.re - D4) * (c.re - D4);
    q * (q + c.re - D4) > (y * D4) && (c.re + 1.0) * (c.re + 1.0) + y > D16
}

/// Iterate `c` for at most `limit` steps, recording the orbit into
/// `trajectory`.  Returns the escape time: the index of the first
/// iterate whose squared magnitude exceeds [`ESCAPE_RADIUS_SQR`],
/// which is also the number of points left in the trajectory.  A
/// result of zero means the point did not escape (or escaped on the
/// very first step, leaving no orbit worth plotting).
pub fn escape_time(c: Complex<f64>, limit: usize, trajectory: &mut Trajectory) -> usize {
    trajectory.points.clear();
    if !maybe_outside(c) {
        return 0;
    }

    let mut z = Complex::new(0.0, 0.0);
    for i in 0..limit {
        z = z * z + c;
        if z.norm_sqr() > ESCAPE_RADIUS_SQR {
            return i;
        }
        trajectory.points.push(z);
    }
    trajectory.points.clear();
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        let mut t = Trajectory::new(50);
        assert_eq!(escape_time(Complex::new(0.0, 0.0), 50, &mut t), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn two_escapes_on_the_second_step() {
        let mut t = Trajectory::new(50);
        assert_eq!(escape_time(Complex::new(2.0, 0.0), 50, &mut t), 1);
        assert_eq!(t.points(), &[Complex::new(2.0, 0.0)]);
    }

    #[test]
    fn far_points_escape_immediately_with_no_orbit() {
        let mut t = Trajectory::new(50);
        assert_eq!(escape_time(Complex::new(3.0, 3.0), 50, &mut t), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn trapped_points_outside_the_bulbs_exhaust_the_cap() {
        // -1.9 lies on the real-axis antenna, outside both bulbs, and
        // never escapes.
        let c = Complex::new(-1.9, 0.0);
        assert!(maybe_outside(c));
        let mut t = Trajectory::new(40);
        assert_eq!(escape_time(c, 40, &mut t), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn escape_time_is_below_the_cap_and_matches_the_orbit() {
        let mut t = Trajectory::new(200);
        for k in 0..400 {
            let c = Complex::new(-2.0 + 0.01 * k as f64, 0.7);
            let et = escape_time(c, 200, &mut t);
            assert!(t.len() <= 200);
            if et != 0 {
                assert!(et < 200);
                assert_eq!(t.len(), et);
            }
        }
    }

    #[test]
    fn bulb_test_rejects_known_interior_points() {
        assert!(!maybe_outside(Complex::new(0.0, 0.0)));
        assert!(!maybe_outside(Complex::new(-1.0, 0.0)));
        assert!(!maybe_outside(Complex::new(0.2, 0.1)));
        assert!(maybe_outside(Complex::new(0.5, 0.5)));
        assert!(maybe_outside(Complex::new(2.0, 0.0)));
    }
}
