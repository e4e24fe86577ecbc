//! # The `Mpcq` engine
//!
//! [`Mpcq`] is the context object that ties an [`ObservationSource`] to the
//! cross-matching and duplicate-detection algorithms. It is constructed once,
//! passed around explicitly, and owns:
//!
//! * the observation source (the only component that performs I/O),
//! * the [`MpcqConfig`] (tolerances and worker count),
//! * a bounded worker pool, built on first use through a
//!   [`OnceCell`](once_cell::sync::OnceCell) and released when the engine is dropped.
//!
//! ## Per-object processing
//! -----------------
//! Batch operations split their work by object designation. Each object is
//! fetched, validated and matched independently on the worker pool:
//!
//! * results are collected in caller order, whatever the completion order;
//! * a failure (fetch error, cancellation) is isolated to its object and
//!   reported next to the successful results;
//! * cancellation is cooperative: `should_cancel()` is checked before each
//!   object starts, and objects that were not started report
//!   [`MpcqError::Cancelled`].
//!
//! ## Examples
//! -----------------
//! ```rust,no_run
//! use mpcq::{Mpcq, MpcqConfig, InMemorySource, Tolerance};
//! use mpcq::observations::csv_reader::read_observations_file;
//! use camino::Utf8Path;
//!
//! # fn demo() -> Result<(), mpcq::MpcqError> {
//! let source = InMemorySource::from_csv(Utf8Path::new("reference.csv"))?;
//! let engine = Mpcq::new(source, MpcqConfig::default());
//!
//! let inputs = read_observations_file(Utf8Path::new("inputs.csv"))?.observations;
//! let report = engine.cross_match(&inputs, &Tolerance::default())?;
//! for result in &report.results {
//!     println!("{} -> {:?}", result.input.obs_id(), result.reference_id());
//! }
//! # Ok(()) }
//! ```
use ahash::RandomState;
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::{
    config::MpcqConfig,
    constants::Designation,
    crossmatch::{cross_match, MatchResult, Tolerance},
    duplicates::{find_duplicates, DuplicateGroup},
    fetch::{ObservationSource, TimeRange},
    mpcq_errors::MpcqError,
    observations::{observation_set::ObservationSet, Observation, ObservationRecord},
    progress_bar::BatchProgress,
    submissions::SubmissionSummary,
};

/// Outcome of the work done for one object of a batch.
#[derive(Debug, PartialEq)]
pub struct ObjectOutcome<T> {
    pub designation: Designation,
    pub result: Result<T, MpcqError>,
}

/// Per-object outcomes, in the order the objects were given.
pub type ObjectResults<T> = Vec<ObjectOutcome<T>>;

/// An object whose cross-match could not be completed.
#[derive(Debug, PartialEq)]
pub struct ObjectFailure {
    pub designation: Designation,
    pub error: MpcqError,
}

/// Result of a batch cross-match.
///
/// `results` always holds exactly one entry per input observation, in input
/// order. Inputs of objects listed in `failures` are reported unmatched.
#[derive(Debug, PartialEq)]
pub struct CrossMatchReport {
    pub results: Vec<MatchResult>,
    pub failures: Vec<ObjectFailure>,
}

impl CrossMatchReport {
    pub fn matched_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_matched()).count()
    }

    /// `true` when every object was processed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Cross-matching and duplicate-detection engine over an [`ObservationSource`].
pub struct Mpcq<S: ObservationSource> {
    source: S,
    config: MpcqConfig,
    pool: OnceCell<ThreadPool>,
}

impl<S: ObservationSource> Mpcq<S> {
    /// Create an engine. The worker pool is not started until the first batch.
    pub fn new(source: S, config: MpcqConfig) -> Self {
        Mpcq {
            source,
            config,
            pool: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &MpcqConfig {
        &self.config
    }

    /// Get the lazily-built worker pool.
    ///
    /// Return
    /// ----------
    /// * the pool, sized by `config.engine.workers` (`0` lets rayon choose)
    /// * [`MpcqError::ThreadPool`] if the threads cannot be spawned
    fn pool(&self) -> Result<&ThreadPool, MpcqError> {
        self.pool.get_or_try_init(|| {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.config.engine.workers)
                .thread_name(|i| format!("mpcq-worker-{i}"))
                .build()?;
            info!(workers = pool.current_num_threads(), "Worker pool ready");
            Ok(pool)
        })
    }

    /// Cross-match caller observations against the reference rows of their objects.
    ///
    /// See [`Mpcq::cross_match_with_cancel`].
    pub fn cross_match(
        &self,
        inputs: &[Observation],
        tolerance: &Tolerance,
    ) -> Result<CrossMatchReport, MpcqError> {
        self.cross_match_with_cancel(inputs, tolerance, || false)
    }

    /// Cross-match caller observations, with cooperative cancellation.
    ///
    /// Inputs are grouped by designation (in order of first appearance). For each
    /// object the source is queried for `[min(t) - tol, max(t) + tol]`, invalid
    /// reference rows are dropped with a warning, and the remaining rows are
    /// matched on the worker pool.
    ///
    /// Arguments
    /// -----------------
    /// * `inputs`: the observations to match
    /// * `tolerance`: the joint time / angle tolerance
    /// * `should_cancel`: polled before each object starts
    ///
    /// Return
    /// ----------
    /// * a [`CrossMatchReport`] with one result per input, in input order
    /// * [`MpcqError::EmptyInput`] when `inputs` is empty; no work is done then
    pub fn cross_match_with_cancel<F>(
        &self,
        inputs: &[Observation],
        tolerance: &Tolerance,
        should_cancel: F,
    ) -> Result<CrossMatchReport, MpcqError>
    where
        F: Fn() -> bool + Sync,
    {
        if inputs.is_empty() {
            return Err(MpcqError::EmptyInput);
        }

        let objects = group_by_designation(inputs);
        info!(
            inputs = inputs.len(),
            objects = objects.len(),
            %tolerance,
            "Cross-matching observations"
        );

        let pool = self.pool()?;
        let progress = BatchProgress::new(objects.len(), "cross-match");
        let outcomes: Vec<Result<Vec<MatchResult>, MpcqError>> = pool.install(|| {
            objects
                .par_iter()
                .map(|(designation, positions)| {
                    let outcome = if should_cancel() {
                        Err(MpcqError::Cancelled)
                    } else {
                        let object_inputs: Vec<Observation> =
                            positions.iter().map(|&i| inputs[i].clone()).collect();
                        self.cross_match_object(designation, &object_inputs, tolerance)
                    };
                    progress.tick();
                    outcome
                })
                .collect()
        });
        progress.finish();

        let mut slots: Vec<Option<MatchResult>> = vec![None; inputs.len()];
        let mut failures = Vec::new();
        for ((designation, positions), outcome) in objects.into_iter().zip(outcomes) {
            match outcome {
                Ok(results) => {
                    for (&pos, result) in positions.iter().zip(results) {
                        slots[pos] = Some(result);
                    }
                }
                Err(error) => {
                    warn!(%designation, %error, "Object could not be cross-matched");
                    failures.push(ObjectFailure { designation, error });
                }
            }
        }

        let results: Vec<MatchResult> = slots
            .into_iter()
            .zip(inputs)
            .map(|(slot, input)| slot.unwrap_or_else(|| MatchResult::unmatched(input.clone())))
            .collect();

        let report = CrossMatchReport { results, failures };
        info!(
            matched = report.matched_count(),
            failed_objects = report.failures.len(),
            "Cross-match done"
        );
        Ok(report)
    }

    fn cross_match_object(
        &self,
        designation: &Designation,
        inputs: &[Observation],
        tolerance: &Tolerance,
    ) -> Result<Vec<MatchResult>, MpcqError> {
        let times = || inputs.iter().map(Observation::obstime);
        let (Some(first), Some(last)) = (times().min(), times().max()) else {
            return Ok(Vec::new());
        };
        let range = TimeRange::widened(first, last, tolerance.time_tolerance_seconds());

        let records = self
            .source
            .fetch_observations(std::slice::from_ref(designation), Some(&range))?;
        let reference = validate_records(designation, records);
        debug!(%designation, inputs = inputs.len(), reference = reference.len(), "Matching object");

        Ok(cross_match(inputs, &reference, tolerance))
    }

    /// Detect duplicate observations of one object.
    ///
    /// Return
    /// ----------
    /// * the duplicate groups of the object (see [`find_duplicates`](crate::duplicates::find_duplicates))
    /// * the fetch error if the object's observations cannot be retrieved
    pub fn find_duplicates(
        &self,
        designation: &Designation,
        tolerance: &Tolerance,
    ) -> Result<Vec<DuplicateGroup>, MpcqError> {
        let records = self
            .source
            .fetch_observations(std::slice::from_ref(designation), None)?;
        let observations = validate_records(designation, records).into_vec();
        let groups = find_duplicates(&observations, tolerance);
        debug!(
            %designation,
            observations = observations.len(),
            groups = groups.len(),
            "Duplicate detection done"
        );
        Ok(groups)
    }

    /// Detect duplicates for several objects on the worker pool.
    pub fn find_duplicates_batch(
        &self,
        designations: &[Designation],
        tolerance: &Tolerance,
    ) -> Result<ObjectResults<Vec<DuplicateGroup>>, MpcqError> {
        self.find_duplicates_batch_with_cancel(designations, tolerance, || false)
    }

    /// Detect duplicates for several objects, with cooperative cancellation.
    ///
    /// Return
    /// ----------
    /// * one [`ObjectOutcome`] per designation, in the given order
    /// * [`MpcqError::EmptyInput`] when `designations` is empty
    pub fn find_duplicates_batch_with_cancel<F>(
        &self,
        designations: &[Designation],
        tolerance: &Tolerance,
        should_cancel: F,
    ) -> Result<ObjectResults<Vec<DuplicateGroup>>, MpcqError>
    where
        F: Fn() -> bool + Sync,
    {
        if designations.is_empty() {
            return Err(MpcqError::EmptyInput);
        }
        info!(objects = designations.len(), %tolerance, "Searching duplicates");

        let pool = self.pool()?;
        let progress = BatchProgress::new(designations.len(), "duplicates");
        let outcomes: ObjectResults<Vec<DuplicateGroup>> = pool.install(|| {
            designations
                .par_iter()
                .map(|designation| {
                    let result = if should_cancel() {
                        Err(MpcqError::Cancelled)
                    } else {
                        self.find_duplicates(designation, tolerance)
                    };
                    if let Err(error) = &result {
                        warn!(%designation, %error, "Duplicate detection failed");
                    }
                    progress.tick();
                    ObjectOutcome {
                        designation: designation.clone(),
                        result,
                    }
                })
                .collect()
        });
        progress.finish();
        Ok(outcomes)
    }

    /// Submission history of the given objects.
    ///
    /// Return
    /// ----------
    /// * one [`SubmissionSummary`] per `(designation, submission)`, ordered by
    ///   primary designation then submission identifier
    /// * [`MpcqError::EmptyInput`] when `designations` is empty, or the fetch error
    pub fn submission_history(
        &self,
        designations: &[Designation],
    ) -> Result<Vec<SubmissionSummary>, MpcqError> {
        if designations.is_empty() {
            return Err(MpcqError::EmptyInput);
        }
        let submissions = self.source.fetch_submission_history(designations)?;
        Ok(SubmissionSummary::from_submissions(submissions))
    }
}

/// Positions of the inputs of each designation, designations in order of first appearance.
fn group_by_designation(inputs: &[Observation]) -> Vec<(Designation, Vec<usize>)> {
    let mut index: HashMap<&Designation, usize, RandomState> = HashMap::default();
    let mut groups: Vec<(Designation, Vec<usize>)> = Vec::new();
    for (pos, obs) in inputs.iter().enumerate() {
        let slot = *index.entry(obs.designation()).or_insert_with(|| {
            groups.push((obs.designation().clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(pos);
    }
    groups
}

/// Validate fetched rows, dropping the invalid ones with a warning.
fn validate_records(designation: &Designation, records: Vec<ObservationRecord>) -> ObservationSet {
    records
        .iter()
        .filter_map(|record| match record.into_observation() {
            Ok(obs) => Some(obs),
            Err(err) => {
                warn!(%designation, obsid = %record.obsid, %err, "Dropping invalid reference row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod mpcq_test {
    use super::*;
    use crate::fetch::InMemorySource;
    use crate::time::parse_timestamp;

    fn obs(id: &str, designation: &str, time: &str) -> Observation {
        Observation::builder(id, designation, parse_timestamp(time).unwrap(), 10.0, 10.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_group_by_designation_first_seen_order() {
        let inputs = vec![
            obs("1", "b", "2023-01-01T00:00:00"),
            obs("2", "a", "2023-01-01T00:00:00"),
            obs("3", "b", "2023-01-01T00:00:00"),
        ];
        let groups = group_by_designation(&inputs);
        assert_eq!(
            groups,
            vec![
                (Designation::from("b"), vec![0, 2]),
                (Designation::from("a"), vec![1]),
            ]
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let engine = Mpcq::new(InMemorySource::default(), MpcqConfig::default());
        assert_eq!(
            engine.cross_match(&[], &Tolerance::default()),
            Err(MpcqError::EmptyInput)
        );
        assert_eq!(
            engine.find_duplicates_batch(&[], &Tolerance::default()),
            Err(MpcqError::EmptyInput)
        );
        assert_eq!(engine.submission_history(&[]), Err(MpcqError::EmptyInput));
        // Nothing was scheduled, so the pool was never built
        assert!(engine.pool.get().is_none());
    }

    #[test]
    fn test_pool_is_sized_from_config() {
        let engine = Mpcq::new(
            InMemorySource::default(),
            MpcqConfig::default().with_workers(2),
        );
        assert_eq!(engine.pool().unwrap().current_num_threads(), 2);
    }

    #[test]
    fn test_invalid_reference_rows_are_dropped() {
        let records = vec![
            ObservationRecord {
                obsid: "r1".into(),
                designation: "433".into(),
                obstime: Some("2023-01-01T00:00:00".into()),
                ra: Some(10.0),
                dec: Some(10.0),
                ..Default::default()
            },
            ObservationRecord {
                obsid: "r2".into(),
                designation: "433".into(),
                obstime: Some("2023-01-01T00:00:01".into()),
                ra: Some(10.0),
                dec: Some(95.0),
                ..Default::default()
            },
        ];
        let set = validate_records(&Designation::Permanent(433), records);
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].obs_id(), "r1");
    }
}
