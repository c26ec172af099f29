//! The radial force law between two particles.
//!
//! Three regimes over the pair's interaction radii `(min_r, max_r)`:
//! a hard-core repulsion below `min_r`, an attraction/repulsion band
//! between `min_r` and `max_r` (flat or tent-shaped), and zero beyond
//! `max_r` or for near-coincident pairs.

/// Minimum separation enforced between particle centers, in world units.
/// Generated minimum radii never fall below this, and the bounce boundary
/// keeps particles this far from the walls.
pub const DIAMETER: f32 = 2.0;

/// Smoothing constant for the hard-core repulsion term. Bounds the
/// repulsive force as the pair distance goes to zero.
pub const R_SMOOTH: f32 = 2.0;

/// Squared distance below which a pair contributes no force. Filters out
/// self-pairs and near-coincident particles before any division by `r`.
pub const MIN_INTERACTION_DIST_SQ: f32 = 0.01;

/// Scalar force magnitude for a pair at distance `r`, given the ordered
/// pair's attraction coefficient and interaction radii. Positive values
/// accelerate the particle toward its partner.
///
/// Total over all inputs: out-of-range and near-coincident distances
/// return exactly `0.0`, and the repulsion term stays bounded as `r -> 0`.
#[inline]
pub fn force_magnitude(r: f32, attract: f32, min_r: f32, max_r: f32, flat: bool) -> f32 {
    let r2 = r * r;
    if r2 > max_r * max_r || r2 < MIN_INTERACTION_DIST_SQ {
        return 0.0;
    }

    if r > min_r {
        if flat {
            attract
        } else {
            // Tent profile: peaks at the band midpoint, zero at both ends.
            // Unreachable when max_r == min_r (the band is empty), so the
            // denominator is never zero here.
            let numer = 2.0 * (r - 0.5 * (max_r + min_r)).abs();
            let denom = max_r - min_r;
            attract * (1.0 - numer / denom)
        }
    } else {
        R_SMOOTH * min_r * (1.0 / (min_r + R_SMOOTH) - 1.0 / (r + R_SMOOTH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_R: f32 = 4.0;
    const MAX_R: f32 = 12.0;

    #[test]
    fn zero_beyond_max_radius() {
        assert_eq!(force_magnitude(MAX_R + 0.001, 5.0, MIN_R, MAX_R, true), 0.0);
        assert_eq!(force_magnitude(1000.0, -3.0, MIN_R, MAX_R, false), 0.0);
    }

    #[test]
    fn zero_for_near_coincident_pairs() {
        // r = 0.05 gives r^2 = 0.0025, inside the coincidence cutoff.
        assert_eq!(force_magnitude(0.05, 5.0, MIN_R, MAX_R, true), 0.0);
        assert_eq!(force_magnitude(0.0, 5.0, MIN_R, MAX_R, false), 0.0);
    }

    #[test]
    fn flat_force_is_constant_across_the_band() {
        for r in [MIN_R + 0.001, 6.0, 8.0, 11.0, MAX_R] {
            assert_eq!(force_magnitude(r, 0.7, MIN_R, MAX_R, true), 0.7);
        }
    }

    #[test]
    fn tent_peaks_at_band_midpoint() {
        let mid = 0.5 * (MIN_R + MAX_R);
        let f = force_magnitude(mid, 0.7, MIN_R, MAX_R, false);
        assert!((f - 0.7).abs() < 1e-6);
    }

    #[test]
    fn tent_vanishes_at_outer_boundary() {
        let f = force_magnitude(MAX_R, 0.7, MIN_R, MAX_R, false);
        assert!(f.abs() < 1e-6);
    }

    #[test]
    fn tent_scales_linearly_between_midpoint_and_edges() {
        // Three quarters of the way out the tent is at half height.
        let r = 0.5 * (MIN_R + MAX_R) + 0.25 * (MAX_R - MIN_R);
        let f = force_magnitude(r, 1.0, MIN_R, MAX_R, false);
        assert!((f - 0.5).abs() < 1e-6);
    }

    #[test]
    fn core_repulsion_is_negative_and_bounded() {
        let f = force_magnitude(1.0, 5.0, MIN_R, MAX_R, true);
        assert!(f < 0.0);
        // The smoothed term never exceeds the r -> 0 limit in magnitude.
        let limit = R_SMOOTH * MIN_R * (1.0 / (MIN_R + R_SMOOTH) - 1.0 / R_SMOOTH);
        assert!(f > limit);
    }

    #[test]
    fn core_repulsion_vanishes_at_min_radius() {
        let f = force_magnitude(MIN_R, 5.0, MIN_R, MAX_R, false);
        assert!(f.abs() < 1e-6);
    }

    #[test]
    fn attraction_sign_carries_through_the_band() {
        assert!(force_magnitude(8.0, -0.4, MIN_R, MAX_R, false) < 0.0);
        assert!(force_magnitude(8.0, 0.4, MIN_R, MAX_R, false) > 0.0);
    }
}
