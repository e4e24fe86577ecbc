//! # Best-match selection
//!
//! Reduce the qualifying candidates of one input to at most one match, using a
//! total order that does not depend on the order candidates were produced in:
//!
//! 1. smaller angular separation (two separations within
//!    [`SEPARATION_TIE_EPS`] are considered equal),
//! 2. smaller time difference,
//! 3. smaller reference identifier (see
//!    [`compare_observation_ids`]: integers first by value, then the
//!    other identifiers lexicographically).
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

use crate::{
    constants::SEPARATION_TIE_EPS, crossmatch::MatchCandidate,
    observations::compare_observation_ids,
};

/// Ordering of two candidates for the same input, best first.
pub fn compare_candidates(a: &MatchCandidate<'_>, b: &MatchCandidate<'_>) -> Ordering {
    let by_separation = if (a.separation_arcsec - b.separation_arcsec).abs() <= SEPARATION_TIE_EPS
    {
        Ordering::Equal
    } else {
        OrderedFloat(a.separation_arcsec).cmp(&OrderedFloat(b.separation_arcsec))
    };

    by_separation
        .then_with(|| {
            OrderedFloat(a.delta_time_seconds).cmp(&OrderedFloat(b.delta_time_seconds))
        })
        .then_with(|| compare_observation_ids(a.reference.obs_id(), b.reference.obs_id()))
}

/// Pick the best candidate, `None` when there is none.
///
/// See also
/// ------------
/// * [`compare_candidates`] – the ordering applied here.
pub fn select_best<'c, 'a>(candidates: &'c [MatchCandidate<'a>]) -> Option<&'c MatchCandidate<'a>> {
    candidates.iter().min_by(|a, b| compare_candidates(a, b))
}
