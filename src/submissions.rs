//! # Submission history
//!
//! Summaries of the batches ("submissions") an object's observations were
//! reported in: how many observations each batch holds, the time span they
//! cover, whether the batch is the first or the last one for the object, and
//! when the batch was submitted.
//!
//! MPC submission identifiers start with the submission time
//! (`2023-01-01T01:02:03.000_0001`). Historical batches use the placeholder
//! identifier `00000000`; for those the time of the last observation is used
//! instead.
use ahash::RandomState;
use hifitime::Epoch;
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use crate::{
    constants::{Designation, SubmissionId, SECONDS_PER_DAY, UNKNOWN_SUBMISSION_ID},
    observations::Observation,
    time::parse_timestamp,
};

/// Observations of one object grouped under one submission identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Designation the history was requested for
    pub requested_designation: Designation,
    /// Designation the observations are attributed to
    pub primary_designation: Designation,
    pub submission_id: SubmissionId,
    /// Number of distinct observation identifiers
    pub num_obs: usize,
    pub first_obs_time: Epoch,
    pub last_obs_time: Epoch,
}

/// A [`Submission`] with the quantities derived from the full history.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionSummary {
    pub submission: Submission,
    pub submission_time: Epoch,
    pub first_submission: bool,
    pub last_submission: bool,
    pub arc_length_days: f64,
}

/// Group observations by primary designation and submission identifier.
///
/// Arguments
/// -----------------
/// * `requested`: the designation the history is requested for
/// * `observations`: the observations returned for that designation
///
/// Return
/// ----------
/// * one [`Submission`] per `(primary designation, submission id)`, sorted by both
pub fn summarize_submissions(
    requested: &Designation,
    observations: &[Observation],
) -> Vec<Submission> {
    let mut grouped: BTreeMap<(&Designation, &str), (HashSet<&str, RandomState>, Epoch, Epoch)> =
        BTreeMap::new();

    for obs in observations {
        let t = obs.obstime();
        let entry = grouped
            .entry((obs.designation(), obs.submission_id()))
            .or_insert_with(|| (HashSet::with_hasher(RandomState::new()), t, t));
        entry.0.insert(obs.obs_id());
        entry.1 = entry.1.min(t);
        entry.2 = entry.2.max(t);
    }

    grouped
        .into_iter()
        .map(|((primary, submission_id), (ids, first, last))| Submission {
            requested_designation: requested.clone(),
            primary_designation: primary.clone(),
            submission_id: submission_id.to_string(),
            num_obs: ids.len(),
            first_obs_time: first,
            last_obs_time: last,
        })
        .collect()
}

/// Submission time of a batch.
///
/// The prefix of the identifier before the first `_` is parsed as an ISO-8601
/// timestamp. The placeholder identifier and unparseable prefixes fall back to
/// `last_obs_time`, with a warning.
pub fn infer_submission_time(submission_id: &str, last_obs_time: Epoch) -> Epoch {
    if submission_id == UNKNOWN_SUBMISSION_ID {
        warn!(
            submission_id,
            "Submission ID is {UNKNOWN_SUBMISSION_ID}, using the last observation time as submission time"
        );
        return last_obs_time;
    }

    let prefix = submission_id.split('_').next().unwrap_or(submission_id);
    match parse_timestamp(prefix) {
        Ok(t) => t,
        Err(err) => {
            warn!(
                submission_id,
                %err,
                "Cannot infer submission time, using the last observation time"
            );
            last_obs_time
        }
    }
}

impl SubmissionSummary {
    /// Derive first/last flags, arc lengths and submission times.
    ///
    /// Submissions are ordered by primary designation, submission identifier and
    /// requested designation. The first and last submission flags are set per
    /// primary designation: when several requested designations resolve to the
    /// same object, its history is flagged once, across all of them.
    pub fn from_submissions(mut submissions: Vec<Submission>) -> Vec<SubmissionSummary> {
        submissions.sort_by(|a, b| {
            (
                &a.primary_designation,
                &a.submission_id,
                &a.requested_designation,
            )
                .cmp(&(
                    &b.primary_designation,
                    &b.submission_id,
                    &b.requested_designation,
                ))
        });

        let mut summaries = Vec::with_capacity(submissions.len());
        for (_, chunk) in &submissions
            .into_iter()
            .chunk_by(|s| s.primary_designation.clone())
        {
            let chunk: Vec<Submission> = chunk.collect();
            let last_idx = chunk.len().saturating_sub(1);
            for (i, submission) in chunk.into_iter().enumerate() {
                summaries.push(SubmissionSummary::new(submission, i == 0, i == last_idx));
            }
        }
        summaries
    }

    fn new(submission: Submission, first_submission: bool, last_submission: bool) -> Self {
        let submission_time =
            infer_submission_time(&submission.submission_id, submission.last_obs_time);
        let arc_length_days =
            (submission.last_obs_time - submission.first_obs_time).to_seconds() / SECONDS_PER_DAY;
        SubmissionSummary {
            submission,
            submission_time,
            first_submission,
            last_submission,
            arc_length_days,
        }
    }
}
