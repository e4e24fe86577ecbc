//! # Fetch layer
//!
//! The engine never talks to the observation warehouse directly: it goes through
//! the [`ObservationSource`] trait, which returns fully materialized rows or
//! fails as a whole.
//!
//! [`InMemorySource`] is a complete implementation over rows held in memory,
//! optionally loaded from a CSV export. It is what the command line tool and the
//! tests use.
use camino::Utf8Path;
use hifitime::Epoch;
use std::fs::File;
use tracing::{debug, warn};

use crate::{
    constants::{Designation, Seconds},
    mpcq_errors::MpcqError,
    observations::{csv_reader::read_records, Observation, ObservationRecord},
    submissions::{summarize_submissions, Submission},
    time::{parse_timestamp, shift_seconds},
};

/// Inclusive time interval used to restrict a fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: Epoch,
    pub end: Epoch,
}

impl TimeRange {
    /// Interval between two epochs, whatever their order.
    pub fn new(a: Epoch, b: Epoch) -> Self {
        TimeRange {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// `[start - margin, end + margin]`
    pub fn widened(start: Epoch, end: Epoch, margin: Seconds) -> Self {
        TimeRange::new(shift_seconds(start, -margin), shift_seconds(end, margin))
    }

    pub fn contains(&self, t: &Epoch) -> bool {
        self.start <= *t && *t <= self.end
    }
}

/// Source of observation rows and submission histories.
///
/// Implementations must be shareable across the worker threads of the engine.
/// Both methods return every requested row or an error; partial results are
/// never returned.
pub trait ObservationSource: Send + Sync {
    /// Observation rows of the given objects, optionally restricted to a time range.
    fn fetch_observations(
        &self,
        designations: &[Designation],
        time_range: Option<&TimeRange>,
    ) -> Result<Vec<ObservationRecord>, MpcqError>;

    /// Per-submission summaries of the given objects.
    fn fetch_submission_history(
        &self,
        designations: &[Designation],
    ) -> Result<Vec<Submission>, MpcqError>;
}

/// An [`ObservationSource`] over rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<ObservationRecord>,
}

impl InMemorySource {
    pub fn from_records(records: Vec<ObservationRecord>) -> Self {
        InMemorySource { records }
    }

    pub fn from_observations(observations: &[Observation]) -> Self {
        InMemorySource {
            records: observations.iter().map(ObservationRecord::from).collect(),
        }
    }

    /// Load rows from CSV content. Rows that cannot be deserialized are logged and
    /// skipped; the others are kept unvalidated, as a warehouse would return them.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, MpcqError> {
        let (records, rejected) = read_records(reader)?;
        if !rejected.is_empty() {
            warn!(
                rejected = rejected.len(),
                "Some reference rows could not be read"
            );
        }
        debug!(rows = records.len(), "In-memory source loaded");
        Ok(InMemorySource { records })
    }

    pub fn from_csv(path: &Utf8Path) -> Result<Self, MpcqError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct designations, in order of first appearance.
    pub fn designations(&self) -> Vec<Designation> {
        let mut seen = Vec::new();
        for record in &self.records {
            let d = Designation::from(record.designation.as_str());
            if !seen.contains(&d) {
                seen.push(d);
            }
        }
        seen
    }

    fn rows_for<'a>(
        &'a self,
        designations: &'a [Designation],
    ) -> impl Iterator<Item = &'a ObservationRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| designations.iter().any(|d| d.matches(&r.designation)))
    }
}

impl ObservationSource for InMemorySource {
    fn fetch_observations(
        &self,
        designations: &[Designation],
        time_range: Option<&TimeRange>,
    ) -> Result<Vec<ObservationRecord>, MpcqError> {
        Ok(self
            .rows_for(designations)
            .filter(|r| {
                let Some(range) = time_range else {
                    return true;
                };
                // Rows with an unreadable time are returned so the caller can reject them
                match parse_timestamp(r.obstime.as_deref().unwrap_or_default()) {
                    Ok(t) => range.contains(&t),
                    Err(_) => true,
                }
            })
            .cloned()
            .collect())
    }

    fn fetch_submission_history(
        &self,
        designations: &[Designation],
    ) -> Result<Vec<Submission>, MpcqError> {
        let mut history = Vec::new();
        for designation in designations {
            let observations: Vec<Observation> = self
                .rows_for(std::slice::from_ref(designation))
                .filter_map(|r| match r.into_observation() {
                    Ok(obs) => Some(obs),
                    Err(err) => {
                        warn!(%designation, obsid = %r.obsid, %err, "Skipping invalid row in submission history");
                        None
                    }
                })
                .collect();
            history.extend(summarize_submissions(designation, &observations));
        }
        Ok(history)
    }
}
