//! # Geometry kernel
//!
//! Angular separation between two sky positions and temporal delta between two
//! timestamps. These are the only two metrics the matcher looks at.
//!
//! ## Conventions
//!
//! - Positions are given in **degrees** (RA in [0, 360), DEC in [-90, 90]) and converted
//!   to radians internally.
//! - Separations are returned in **arcseconds**; the underlying great-circle angle is
//!   always in [0, 180] degrees.
//! - Time deltas are returned in **seconds**, computed from hifitime durations
//!   (nanosecond resolution), so sub-second offsets are never truncated.
//!
//! ## Formula
//!
//! The separation uses the haversine formulation evaluated through `atan2`:
//!
//! ```text
//! h   = sin²(Δδ/2) + cos δ1 · cos δ2 · sin²(Δα/2)
//! sep = 2 · atan2(√h, √(1 − h))
//! ```
//!
//! `Δα` and `Δδ` are taken as absolute differences, which makes the kernel bitwise
//! symmetric (`sep(A, B) == sep(B, A)`), and `sin²(Δα/2)` is periodic in 360°, so two
//! points on either side of RA = 0 are measured the short way around.
use hifitime::Epoch;

use crate::{
    constants::{ArcSec, Degree, Seconds, ARCSEC_PER_DEG, FULL_CIRCLE_DEG},
    time::seconds_to_duration,
};

/// Angular separation between two sky positions.
///
/// Arguments
/// -----------------
/// * `ra1`, `dec1`: first position (degrees)
/// * `ra2`, `dec2`: second position (degrees)
///
/// Return
/// ----------
/// * The great-circle distance in **arcseconds**
///
/// See also
/// ------------
/// * [`time_delta`] – the temporal counterpart used alongside this metric.
#[inline]
pub fn angular_separation(ra1: Degree, dec1: Degree, ra2: Degree, dec2: Degree) -> ArcSec {
    let dra = (ra1 - ra2).abs().to_radians();
    let ddec = (dec1 - dec2).abs().to_radians();

    let sin_half_ddec = (ddec * 0.5).sin();
    let sin_half_dra = (dra * 0.5).sin();
    let cos_product = dec1.to_radians().cos() * dec2.to_radians().cos();

    let h = (sin_half_ddec * sin_half_ddec + cos_product * sin_half_dra * sin_half_dra)
        .clamp(0.0, 1.0);

    let sep_deg = (2.0 * h.sqrt().atan2((1.0 - h).sqrt())).to_degrees();
    sep_deg.clamp(0.0, 180.0) * ARCSEC_PER_DEG
}

/// Absolute time difference between two timestamps, in seconds.
#[inline]
pub fn time_delta(t1: &Epoch, t2: &Epoch) -> Seconds {
    (*t1 - *t2).abs().to_seconds()
}

/// `true` when `|t1 - t2| <= tolerance`, compared at nanosecond resolution.
///
/// The comparison is done between durations, the same way the windower bounds
/// its search, so a timestamp exactly `tolerance` seconds away qualifies.
#[inline]
pub fn within_time_tolerance(t1: &Epoch, t2: &Epoch, tolerance: Seconds) -> bool {
    (*t1 - *t2).abs() <= seconds_to_duration(tolerance)
}

/// Wrap a right ascension into [0, 360).
#[inline]
pub fn normalize_ra(ra: Degree) -> Degree {
    let wrapped = ra.rem_euclid(FULL_CIRCLE_DEG);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= FULL_CIRCLE_DEG {
        0.0
    } else {
        wrapped
    }
}

#[inline]
pub fn arcsec_to_deg(arcsec: ArcSec) -> Degree {
    arcsec / ARCSEC_PER_DEG
}

#[cfg(test)]
mod geometry_test {
    use super::*;
    use crate::time::parse_timestamp;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_identical_positions() {
        assert_eq!(angular_separation(123.4, -45.6, 123.4, -45.6), 0.0);
    }

    #[test]
    fn test_wraparound_short_way() {
        let sep = angular_separation(0.5, 0.0, 359.6, 0.0);
        assert_relative_eq!(arcsec_to_deg(sep), 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_declination_scaling() {
        // 1 degree of RA at dec = 60 is ~0.5 degree on the sky
        let sep = angular_separation(10.0, 60.0, 11.0, 60.0);
        assert_relative_eq!(arcsec_to_deg(sep), 0.4999, epsilon = 1e-3);
    }

    #[test]
    fn test_poles_and_antipodes() {
        assert_relative_eq!(
            arcsec_to_deg(angular_separation(0.0, 90.0, 180.0, -90.0)),
            180.0,
            epsilon = 1e-9
        );
        // Every RA is the same point at the pole
        assert!(angular_separation(10.0, 90.0, 250.0, 90.0) < 1e-6);
    }

    #[test]
    fn test_small_separation_scenario() {
        let sep = angular_separation(123.884679, 19.820047, 123.884700, 19.820050);
        assert!((sep - 0.076).abs() < 0.01, "sep = {sep}");
    }

    #[test]
    fn test_time_delta() {
        let t1 = parse_timestamp("2023-01-01T00:00:00").unwrap();
        let t2 = parse_timestamp("2023-01-01T00:00:05.125").unwrap();
        assert_relative_eq!(time_delta(&t1, &t2), 5.125, epsilon = 1e-9);
        assert_eq!(time_delta(&t1, &t2), time_delta(&t2, &t1));
        assert_eq!(time_delta(&t1, &t1), 0.0);
    }

    #[test]
    fn test_time_tolerance_boundary_is_inclusive() {
        let t0 = parse_timestamp("2023-01-01T00:00:00").unwrap();
        for (offset, tolerance) in [
            ("2023-01-01T00:00:00.300", 0.3),
            ("2023-01-01T00:00:00.700", 0.7),
            ("2023-01-01T00:00:01.001", 1.001),
            ("2023-01-01T00:00:29.900", 29.9),
        ] {
            let t1 = parse_timestamp(offset).unwrap();
            assert!(within_time_tolerance(&t0, &t1, tolerance), "{offset} / {tolerance}");
            assert!(within_time_tolerance(&t1, &t0, tolerance), "{offset} / {tolerance}");
            assert!(!within_time_tolerance(&t0, &t1, tolerance - 1e-6));
        }
        assert!(within_time_tolerance(&t0, &t0, 0.0));
    }

    #[test]
    fn test_normalize_ra() {
        assert_eq!(normalize_ra(360.0), 0.0);
        assert_eq!(normalize_ra(-0.5), 359.5);
        assert_eq!(normalize_ra(720.25), 0.25);
        assert!(normalize_ra(-1e-20) < 360.0);
    }

    proptest! {
        #[test]
        fn prop_separation_is_symmetric(
            ra1 in 0.0f64..360.0, dec1 in -90.0f64..=90.0,
            ra2 in 0.0f64..360.0, dec2 in -90.0f64..=90.0,
        ) {
            prop_assert_eq!(
                angular_separation(ra1, dec1, ra2, dec2),
                angular_separation(ra2, dec2, ra1, dec1)
            );
        }

        #[test]
        fn prop_separation_in_range(
            ra1 in 0.0f64..360.0, dec1 in -90.0f64..=90.0,
            ra2 in 0.0f64..360.0, dec2 in -90.0f64..=90.0,
        ) {
            let sep = angular_separation(ra1, dec1, ra2, dec2);
            prop_assert!((0.0..=180.0 * ARCSEC_PER_DEG).contains(&sep));
        }

        #[test]
        fn prop_ra_shift_by_full_circle_is_invariant(
            ra in 0.0f64..360.0, dec in -89.0f64..89.0, dra in -0.01f64..0.01,
        ) {
            let a = angular_separation(ra, dec, normalize_ra(ra + dra), dec);
            let b = angular_separation(ra, dec, ra + dra, dec);
            prop_assert!((a - b).abs() < 1e-6);
        }
    }
}
