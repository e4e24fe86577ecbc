//! Joint time and angle tolerance evaluation.
use smallvec::SmallVec;

use crate::{
    crossmatch::{MatchCandidate, Tolerance},
    geometry::{angular_separation, time_delta, within_time_tolerance},
    observations::Observation,
};

/// Evaluate one (input, reference) pair against the tolerance.
///
/// Return
/// ------
/// * `Some(candidate)` when `delta_time <= time tolerance` **and**
///   `separation <= angle tolerance`, `None` otherwise
#[inline]
pub fn evaluate<'a>(
    input: &'a Observation,
    reference: &'a Observation,
    tolerance: &Tolerance,
) -> Option<MatchCandidate<'a>> {
    let (t_in, t_ref) = (input.obstime(), reference.obstime());
    if !within_time_tolerance(&t_in, &t_ref, tolerance.time_tolerance_seconds()) {
        return None;
    }
    let delta_time_seconds = time_delta(&t_in, &t_ref);

    let separation_arcsec =
        angular_separation(input.ra(), input.dec(), reference.ra(), reference.dec());
    if separation_arcsec > tolerance.angle_tolerance_arcsec() {
        return None;
    }

    Some(MatchCandidate {
        input,
        reference,
        delta_time_seconds,
        separation_arcsec,
    })
}

/// Every qualifying candidate for `input` among the windowed reference rows.
///
/// Arguments
/// -----------------
/// * `input`: the observation to match
/// * `window`: reference rows already narrowed to the time window of `input`
/// * `tolerance`: the joint tolerance
///
/// Return
/// ----------
/// * the qualifying candidates, in the order of `window`. Most inputs have zero or
///   one candidate, so the result stays inline for up to four.
pub fn qualifying_candidates<'a>(
    input: &'a Observation,
    window: &'a [Observation],
    tolerance: &Tolerance,
) -> SmallVec<[MatchCandidate<'a>; 4]> {
    window
        .iter()
        .filter_map(|reference| evaluate(input, reference, tolerance))
        .collect()
}
