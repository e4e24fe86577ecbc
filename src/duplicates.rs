//! # Duplicate detection
//!
//! Find observations of one object that were reported more than once, typically
//! under different submission identifiers.
//!
//! ## Algorithm
//! -----------------
//! 1. Sort the object's observations by `(obstime, obs_id)` and partition them by
//!    submission identifier.
//! 2. For every pair of distinct submissions (each unordered pair once, in
//!    submission order), window the partner submission around each observation
//!    and evaluate the joint tolerance with the cross-match
//!    [`matcher`](crate::crossmatch::matcher). Pairs sharing the same
//!    observation identifier are skipped.
//! 3. Qualifying pairs become edges of a union-find forest (path halving, the
//!    smaller root wins). Every component with two or more members is one
//!    [`DuplicateGroup`].
//!
//! Groups are connected components, so membership is symmetric and transitive:
//! if `A ~ B` and `B ~ C` then `A`, `B` and `C` share a group even when `A` and
//! `C` are out of tolerance. Such a group can hold two rows of the same
//! submission, joined through a third one.
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    crossmatch::{matcher::evaluate, Tolerance},
    observations::{
        compare_observation_ids,
        observation_set::{time_window, ObservationSet},
        Observation,
    },
};

/// A set of observations that record the same detection event.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    canonical: Observation,
    duplicates: Vec<Observation>,
}

impl DuplicateGroup {
    /// The row kept as the reference for the group: the earliest created one
    /// (rows without a creation time come last), then the earliest observed,
    /// then the smallest identifier.
    pub fn canonical(&self) -> &Observation {
        &self.canonical
    }

    /// The other members, sorted by `(obstime, obs_id)`.
    pub fn duplicates(&self) -> &[Observation] {
        &self.duplicates
    }

    /// All members, canonical first.
    pub fn members(&self) -> impl Iterator<Item = &Observation> {
        std::iter::once(&self.canonical).chain(self.duplicates.iter())
    }

    /// Number of members, canonical included (always at least two).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + self.duplicates.len()
    }

    /// Distinct submission identifiers present in the group.
    pub fn submission_ids(&self) -> BTreeSet<&str> {
        self.members().map(Observation::submission_id).collect()
    }
}

/// Order used to elect the canonical row of a group.
fn canonical_order(a: &Observation, b: &Observation) -> Ordering {
    let created = match (a.created_at(), b.created_at()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    created
        .then_with(|| a.obstime().cmp(&b.obstime()))
        .then_with(|| compare_observation_ids(a.obs_id(), b.obs_id()))
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]]; // path halving
        x = parent[x];
    }
    x
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

/// Detect duplicate observations of a single object.
///
/// Arguments
/// -----------------
/// * `observations`: every observation of the object, in any order
/// * `tolerance`: the joint time / angle tolerance for two rows to be duplicates
///
/// Return
/// ----------
/// * the duplicate groups, sorted by the `(obstime, obs_id)` of their canonical
///   row. Observations without a duplicate are not reported.
///
/// See also
/// ------------
/// * [`crate::crossmatch::cross_match`] – the same windower and matcher against
///   an external reference set.
pub fn find_duplicates(observations: &[Observation], tolerance: &Tolerance) -> Vec<DuplicateGroup> {
    let set = ObservationSet::new(observations.to_vec());
    let rows = set.as_slice();

    // Index lists stay time-sorted because `rows` is.
    let mut by_submission: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, obs) in rows.iter().enumerate() {
        by_submission.entry(obs.submission_id()).or_default().push(i);
    }

    let mut parent: Vec<usize> = (0..rows.len()).collect();

    for ((_, left), (_, right)) in by_submission.iter().tuple_combinations() {
        for &i in left {
            let range = time_window(
                right,
                |j: &usize| rows[*j].obstime(),
                rows[i].obstime(),
                tolerance.time_tolerance_seconds(),
            );
            for &j in &right[range] {
                if rows[i].obs_id() == rows[j].obs_id() {
                    continue;
                }
                if evaluate(&rows[i], &rows[j], tolerance).is_some() {
                    union(&mut parent, i, j);
                }
            }
        }
    }

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..rows.len() {
        let root = find(&mut parent, i);
        components.entry(root).or_default().push(i);
    }

    let mut groups: Vec<DuplicateGroup> = components
        .into_values()
        .filter(|members| members.len() >= 2)
        .filter_map(|members| {
            let canonical_idx = members
                .iter()
                .copied()
                .min_by(|&a, &b| canonical_order(&rows[a], &rows[b]))?;
            let duplicates = members
                .iter()
                .filter(|&&i| i != canonical_idx)
                .map(|&i| rows[i].clone())
                .collect();
            Some(DuplicateGroup {
                canonical: rows[canonical_idx].clone(),
                duplicates,
            })
        })
        .collect();

    groups.sort_by(|a, b| {
        a.canonical
            .obstime()
            .cmp(&b.canonical.obstime())
            .then_with(|| compare_observation_ids(a.canonical.obs_id(), b.canonical.obs_id()))
    });
    groups
}

#[cfg(test)]
mod duplicates_test {
    use super::*;
    use crate::time::{parse_timestamp, shift_seconds};

    fn obs(id: &str, sub: &str, offset_s: f64, ra: f64, dec: f64) -> Observation {
        let t0 = parse_timestamp("2023-01-01T00:00:00").unwrap();
        Observation::builder(id, "2013 RR165", shift_seconds(t0, offset_s), ra, dec)
            .submission_id(sub)
            .build()
            .unwrap()
    }

    fn ids(group: &DuplicateGroup) -> Vec<&str> {
        group.members().map(Observation::obs_id).collect()
    }

    #[test]
    fn test_two_submissions_same_event() {
        let rows = vec![
            obs("1", "sub_a", 0.0, 50.0, 5.0),
            obs("2", "sub_b", 1.0, 50.0, 5.0 + 0.5 / 3600.0),
            obs("3", "sub_b", 900.0, 51.0, 5.0),
        ];

        let groups = find_duplicates(&rows, &Tolerance::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), ["1", "2"]);
        assert_eq!(
            groups[0].submission_ids().into_iter().collect::<Vec<_>>(),
            ["sub_a", "sub_b"]
        );
    }

    #[test]
    fn test_same_submission_is_not_a_duplicate() {
        let rows = vec![
            obs("1", "sub_a", 0.0, 50.0, 5.0),
            obs("2", "sub_a", 0.0, 50.0, 5.0),
        ];
        assert!(find_duplicates(&rows, &Tolerance::default()).is_empty());
    }

    #[test]
    fn test_identical_ids_are_skipped() {
        let rows = vec![
            obs("7", "sub_a", 0.0, 50.0, 5.0),
            obs("7", "sub_b", 0.0, 50.0, 5.0),
        ];
        assert!(find_duplicates(&rows, &Tolerance::default()).is_empty());
    }

    #[test]
    fn test_transitive_groups() {
        // A ~ B (1.5″), B ~ C (1.5″), A and C are 3″ apart
        let step = 1.5 / 3600.0;
        let rows = vec![
            obs("a", "s1", 0.0, 80.0, 0.0),
            obs("b", "s2", 0.0, 80.0, step),
            obs("c", "s3", 0.0, 80.0, 2.0 * step),
        ];

        let groups = find_duplicates(&rows, &Tolerance::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_canonical_prefers_earliest_created() {
        let t0 = parse_timestamp("2023-01-01T00:00:00").unwrap();
        let early = parse_timestamp("2020-05-01T00:00:00").unwrap();
        let late = parse_timestamp("2021-05-01T00:00:00").unwrap();

        let make = |id: &str, sub: &str, created: Option<hifitime::Epoch>| {
            Observation::builder(id, 433u32, t0, 50.0, 5.0)
                .submission_id(sub)
                .created_at(created)
                .build()
                .unwrap()
        };
        let rows = vec![
            make("1", "s1", None),
            make("2", "s2", Some(late)),
            make("3", "s3", Some(early)),
        ];

        let groups = find_duplicates(&rows, &Tolerance::default());
        assert_eq!(groups[0].canonical().obs_id(), "3");
        let dups: Vec<_> = groups[0].duplicates().iter().map(Observation::obs_id).collect();
        assert_eq!(dups, ["1", "2"]);
    }

    #[test]
    fn test_groups_sorted_and_input_order_independent() {
        let rows = vec![
            obs("10", "x", 3600.0, 10.0, 10.0),
            obs("11", "y", 3601.0, 10.0, 10.0),
            obs("20", "x", 0.0, 20.0, 20.0),
            obs("21", "y", 2.0, 20.0, 20.0),
        ];

        let groups = find_duplicates(&rows, &Tolerance::default());
        let canonical: Vec<_> = groups.iter().map(|g| g.canonical().obs_id()).collect();
        assert_eq!(canonical, ["20", "10"]);

        let mut reversed = rows.clone();
        reversed.reverse();
        assert_eq!(find_duplicates(&reversed, &Tolerance::default()), groups);
    }
}
