//! # Time-sorted observation container and candidate windower
//!
//! [`ObservationSet`] keeps observations sorted by `(obstime, obs_id)` in one
//! contiguous `Vec`, with a parallel column of timestamps. For a query time `t`
//! and a tolerance `tol`, [`ObservationSet::window`] returns the contiguous slice
//! whose timestamps fall in `[t - tol, t + tol]` using two binary searches,
//! so the cost per query is `O(log n + k)` for `k` rows in the window.
//!
//! The same search is exposed as the free function [`time_window`] so any
//! time-sorted slice (for example a list of indices into a set) can be windowed.
use hifitime::Epoch;
use std::ops::Range;

use crate::{
    constants::Seconds,
    observations::{compare_observation_ids, Observation},
    time::shift_seconds,
};

/// Index range of the items whose key lies in `[t - tol, t + tol]`.
///
/// Arguments
/// -----------------
/// * `items`: a slice sorted by `key` (ascending)
/// * `key`: extracts the timestamp of an item
/// * `t`: the query time
/// * `tolerance`: half-width of the window, in seconds (non-negative)
///
/// Return
/// ----------
/// * the half-open index range of the matching items; empty when nothing qualifies
pub fn time_window<T, F>(items: &[T], key: F, t: Epoch, tolerance: Seconds) -> Range<usize>
where
    F: Fn(&T) -> Epoch,
{
    let lower = shift_seconds(t, -tolerance);
    let upper = shift_seconds(t, tolerance);

    let start = items.partition_point(|item| key(item) < lower);
    let end = items.partition_point(|item| key(item) <= upper);
    start..end.max(start)
}

/// A set of observations sorted by `(obstime, obs_id)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
    observations: Vec<Observation>,
    times: Vec<Epoch>,
}

impl ObservationSet {
    /// Sort the observations and build the timestamp column.
    pub fn new(mut observations: Vec<Observation>) -> Self {
        observations.sort_by(|a, b| {
            a.obstime()
                .cmp(&b.obstime())
                .then_with(|| compare_observation_ids(a.obs_id(), b.obs_id()))
        });
        let times = observations.iter().map(Observation::obstime).collect();
        ObservationSet {
            observations,
            times,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Earliest and latest observation time, `None` for an empty set.
    pub fn time_span(&self) -> Option<(Epoch, Epoch)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    /// Index range of the observations within `tolerance` seconds of `t`.
    pub fn window_range(&self, t: Epoch, tolerance: Seconds) -> Range<usize> {
        time_window(&self.times, |e| *e, t, tolerance)
    }

    /// Observations within `tolerance` seconds of `t`, in set order.
    ///
    /// See also
    /// ------------
    /// * [`time_window`] – the underlying binary search.
    pub fn window(&self, t: Epoch, tolerance: Seconds) -> &[Observation] {
        &self.observations[self.window_range(t, tolerance)]
    }

    pub fn into_vec(self) -> Vec<Observation> {
        self.observations
    }
}

impl FromIterator<Observation> for ObservationSet {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        ObservationSet::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

#[cfg(test)]
mod observation_set_test {
    use super::*;
    use crate::time::parse_timestamp;
    use proptest::prelude::*;

    fn obs_at(id: &str, offset_ms: i64) -> Observation {
        let t0 = parse_timestamp("2023-01-01T00:00:00").unwrap();
        Observation::builder(id, 433u32, shift_seconds(t0, offset_ms as f64 / 1000.0), 10.0, 10.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_sorted_by_time_then_id() {
        let set = ObservationSet::new(vec![
            obs_at("3", 1000),
            obs_at("10", 0),
            obs_at("9", 0),
        ]);
        let ids: Vec<_> = set.iter().map(Observation::obs_id).collect();
        assert_eq!(ids, ["9", "10", "3"]);
    }

    #[test]
    fn test_window_is_inclusive() {
        let set: ObservationSet = [-30_000, -30_001, 0, 29_999, 30_000, 30_001]
            .iter()
            .enumerate()
            .map(|(i, ms)| obs_at(&i.to_string(), *ms))
            .collect();

        let t0 = parse_timestamp("2023-01-01T00:00:00").unwrap();
        let ids: Vec<_> = set.window(t0, 30.0).iter().map(Observation::obs_id).collect();
        assert_eq!(ids, ["0", "2", "3", "4"]);

        assert_eq!(set.window(t0, 0.0).len(), 1);
        let far = shift_seconds(t0, 3600.0);
        assert!(set.window(far, 30.0).is_empty());
    }

    #[test]
    fn test_empty_set() {
        let set = ObservationSet::default();
        let t0 = parse_timestamp("2023-01-01T00:00:00").unwrap();
        assert!(set.window(t0, 30.0).is_empty());
        assert!(set.time_span().is_none());
    }

    proptest! {
        #[test]
        fn prop_window_equals_linear_scan(
            offsets in proptest::collection::vec(-120_000i64..120_000, 0..60),
            query in -150_000i64..150_000,
            tol_s in 0u32..60,
        ) {
            let set: ObservationSet = offsets
                .iter()
                .enumerate()
                .map(|(i, ms)| obs_at(&i.to_string(), *ms))
                .collect();

            let t0 = parse_timestamp("2023-01-01T00:00:00").unwrap();
            let t = shift_seconds(t0, query as f64 / 1000.0);
            let tol = tol_s as f64;

            let windowed: Vec<_> = set.window(t, tol).iter().map(Observation::obs_id).collect();
            let scanned: Vec<_> = set
                .iter()
                .filter(|o| (o.obstime() - t).abs().to_seconds() <= tol)
                .map(Observation::obs_id)
                .collect();
            prop_assert_eq!(windowed, scanned);
        }
    }
}
