#![allow(dead_code)]

use ahash::AHashSet;
use approx::assert_relative_eq;
use camino::Utf8PathBuf;
use hifitime::Epoch;

use mpcq::{
    crossmatch::MatchResult,
    fetch::{InMemorySource, ObservationSource, TimeRange},
    observations::ObservationRecord,
    submissions::Submission,
    time::{parse_timestamp, shift_seconds},
    Designation, MpcqError, Observation,
};

pub fn data_path(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn epoch(s: &str) -> Epoch {
    parse_timestamp(s).unwrap()
}

/// Observation at `offset_s` seconds after `t0`.
pub fn obs_at(
    id: &str,
    designation: &str,
    submission_id: &str,
    t0: &str,
    offset_s: f64,
    ra: f64,
    dec: f64,
) -> Observation {
    Observation::builder(id, designation, shift_seconds(epoch(t0), offset_s), ra, dec)
        .stn("F51")
        .submission_id(submission_id)
        .build()
        .unwrap()
}

pub fn assert_matched(result: &MatchResult, reference_id: &str, sep_arcsec: f64, dt_s: f64) {
    assert_eq!(result.reference_id(), Some(reference_id));
    assert_relative_eq!(result.separation_arcsec.unwrap(), sep_arcsec, epsilon = 1e-3);
    assert_relative_eq!(result.separation_seconds.unwrap(), dt_s, epsilon = 1e-6);
}

pub fn assert_unmatched(result: &MatchResult) {
    assert!(result.reference.is_none());
    assert!(result.separation_arcsec.is_none());
    assert!(result.separation_seconds.is_none());
}

/// Source that fails for some designations and delegates to an in-memory source otherwise.
pub struct FailingSource {
    pub inner: InMemorySource,
    pub failing: AHashSet<Designation>,
}

impl FailingSource {
    pub fn new(observations: &[Observation], failing: &[Designation]) -> Self {
        FailingSource {
            inner: InMemorySource::from_observations(observations),
            failing: failing.iter().cloned().collect(),
        }
    }

    fn check(&self, designations: &[Designation]) -> Result<(), MpcqError> {
        match designations.iter().find(|d| self.failing.contains(*d)) {
            Some(d) => Err(MpcqError::Fetch {
                designation: d.clone(),
                reason: "warehouse unavailable".into(),
            }),
            None => Ok(()),
        }
    }
}

impl ObservationSource for FailingSource {
    fn fetch_observations(
        &self,
        designations: &[Designation],
        time_range: Option<&TimeRange>,
    ) -> Result<Vec<ObservationRecord>, MpcqError> {
        self.check(designations)?;
        self.inner.fetch_observations(designations, time_range)
    }

    fn fetch_submission_history(
        &self,
        designations: &[Designation],
    ) -> Result<Vec<Submission>, MpcqError> {
        self.check(designations)?;
        self.inner.fetch_submission_history(designations)
    }
}
