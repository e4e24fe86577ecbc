//! # Tabular and JSON rendering
//!
//! Flattened row views of match results, duplicate groups and submission
//! histories, rendered either as a [`comfy-table`] table through the display
//! adaptors ([`MatchTable`], [`DuplicateTable`], [`SubmissionTable`]) or as JSON
//! through [`to_json`].
//!
//! ## Conventions
//!
//! - **Time**: ISO-8601 UTC, `YYYY-MM-DDTHH:MM:SS[.fffffffff]`.
//! - **Angles**: RA/DEC in degrees, separations in arcseconds.
//! - Unmatched inputs keep their row with empty match columns.
//!
//! ## Quick examples
//!
//! ```rust,ignore
//! use mpcq::observations::display::{MatchTable, to_json, match_rows};
//!
//! println!("{}", MatchTable::new(&report.results));
//! println!("{}", to_json(&match_rows(&report.results))?);
//! ```
//!
//! [`comfy-table`]: https://crates.io/crates/comfy-table
use std::fmt;

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};
use serde::Serialize;

use crate::{
    constants::Designation, crossmatch::MatchResult, duplicates::DuplicateGroup,
    mpcq_errors::MpcqError, observations::Observation, submissions::SubmissionSummary,
    time::format_timestamp,
};

/// One cross-match result, flattened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    pub input_obsid: String,
    pub designation: String,
    pub obstime: String,
    pub ra: f64,
    pub dec: f64,
    pub stn: String,
    pub matched_obsid: Option<String>,
    pub matched_submission_id: Option<String>,
    pub separation_arcsec: Option<f64>,
    pub separation_seconds: Option<f64>,
}

/// One member of a duplicate group, flattened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateRow {
    pub group: usize,
    pub designation: String,
    pub canonical: bool,
    pub obsid: String,
    pub obstime: String,
    pub ra: f64,
    pub dec: f64,
    pub stn: String,
    pub submission_id: String,
    pub created_at: Option<String>,
}

/// One submission summary, flattened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionRow {
    pub requested_designation: String,
    pub primary_designation: String,
    pub submission_id: String,
    pub submission_time: String,
    pub first_submission: bool,
    pub last_submission: bool,
    pub num_obs: usize,
    pub first_obs_time: String,
    pub last_obs_time: String,
    pub arc_length_days: f64,
}

pub fn match_rows(results: &[MatchResult]) -> Vec<MatchRow> {
    results
        .iter()
        .map(|r| MatchRow {
            input_obsid: r.input.obs_id().to_string(),
            designation: r.input.designation().to_string(),
            obstime: format_timestamp(&r.input.obstime()),
            ra: r.input.ra(),
            dec: r.input.dec(),
            stn: r.input.stn().to_string(),
            matched_obsid: r.reference.as_ref().map(|o| o.obs_id().to_string()),
            matched_submission_id: r.reference.as_ref().map(|o| o.submission_id().to_string()),
            separation_arcsec: r.separation_arcsec,
            separation_seconds: r.separation_seconds,
        })
        .collect()
}

/// Rows of the duplicate groups of one object; `group` numbers start at 1.
pub fn duplicate_rows(designation: &Designation, groups: &[DuplicateGroup]) -> Vec<DuplicateRow> {
    let row = |group: usize, canonical: bool, obs: &Observation| DuplicateRow {
        group,
        designation: designation.to_string(),
        canonical,
        obsid: obs.obs_id().to_string(),
        obstime: format_timestamp(&obs.obstime()),
        ra: obs.ra(),
        dec: obs.dec(),
        stn: obs.stn().to_string(),
        submission_id: obs.submission_id().to_string(),
        created_at: obs.created_at().as_ref().map(format_timestamp),
    };

    groups
        .iter()
        .enumerate()
        .flat_map(|(i, g)| {
            std::iter::once(row(i + 1, true, g.canonical()))
                .chain(g.duplicates().iter().map(move |o| row(i + 1, false, o)))
        })
        .collect()
}

pub fn submission_rows(summaries: &[SubmissionSummary]) -> Vec<SubmissionRow> {
    summaries
        .iter()
        .map(|s| SubmissionRow {
            requested_designation: s.submission.requested_designation.to_string(),
            primary_designation: s.submission.primary_designation.to_string(),
            submission_id: s.submission.submission_id.clone(),
            submission_time: format_timestamp(&s.submission_time),
            first_submission: s.first_submission,
            last_submission: s.last_submission,
            num_obs: s.submission.num_obs,
            first_obs_time: format_timestamp(&s.submission.first_obs_time),
            last_obs_time: format_timestamp(&s.submission.last_obs_time),
            arc_length_days: s.arc_length_days,
        })
        .collect()
}

/// Pretty-printed JSON array of rows.
pub fn to_json<T: Serialize>(rows: &[T]) -> Result<String, MpcqError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.iter().map(|h| Cell::new(*h)).collect::<Vec<_>>());
    table
}

fn opt_cell(value: Option<String>) -> Cell {
    Cell::new(value.unwrap_or_default()).set_alignment(CellAlignment::Right)
}

fn right(value: impl fmt::Display) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

/// Display adaptor rendering cross-match results as a table.
pub struct MatchTable<'a> {
    results: &'a [MatchResult],
}

impl<'a> MatchTable<'a> {
    pub fn new(results: &'a [MatchResult]) -> Self {
        MatchTable { results }
    }
}

impl fmt::Display for MatchTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = new_table(&[
            "Input", "Object", "Time (UTC)", "RA [deg]", "DEC [deg]", "Stn", "Match",
            "Sep [arcsec]", "Δt [s]",
        ]);
        for r in match_rows(self.results) {
            table.add_row(Row::from(vec![
                right(r.input_obsid),
                Cell::new(r.designation),
                Cell::new(r.obstime),
                right(format!("{:.6}", r.ra)),
                right(format!("{:.6}", r.dec)),
                Cell::new(r.stn),
                opt_cell(r.matched_obsid),
                opt_cell(r.separation_arcsec.map(|s| format!("{s:.4}"))),
                opt_cell(r.separation_seconds.map(|s| format!("{s:.3}"))),
            ]));
        }
        write!(f, "{table}")
    }
}

/// Display adaptor rendering the duplicate groups of one object as a table.
pub struct DuplicateTable<'a> {
    designation: &'a Designation,
    groups: &'a [DuplicateGroup],
}

impl<'a> DuplicateTable<'a> {
    pub fn new(designation: &'a Designation, groups: &'a [DuplicateGroup]) -> Self {
        DuplicateTable {
            designation,
            groups,
        }
    }
}

impl fmt::Display for DuplicateTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = new_table(&[
            "Group", "Role", "Obs ID", "Time (UTC)", "RA [deg]", "DEC [deg]", "Stn",
            "Submission", "Created",
        ]);
        for r in duplicate_rows(self.designation, self.groups) {
            table.add_row(Row::from(vec![
                right(r.group),
                Cell::new(if r.canonical { "canonical" } else { "duplicate" }),
                right(r.obsid),
                Cell::new(r.obstime),
                right(format!("{:.6}", r.ra)),
                right(format!("{:.6}", r.dec)),
                Cell::new(r.stn),
                Cell::new(r.submission_id),
                Cell::new(r.created_at.unwrap_or_default()),
            ]));
        }
        write!(f, "{table}")
    }
}

/// Display adaptor rendering submission summaries as a table.
pub struct SubmissionTable<'a> {
    summaries: &'a [SubmissionSummary],
}

impl<'a> SubmissionTable<'a> {
    pub fn new(summaries: &'a [SubmissionSummary]) -> Self {
        SubmissionTable { summaries }
    }
}

impl fmt::Display for SubmissionTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = new_table(&[
            "Requested", "Primary", "Submission", "Submitted (UTC)", "First", "Last", "N obs",
            "Arc [d]",
        ]);
        for r in submission_rows(self.summaries) {
            table.add_row(Row::from(vec![
                Cell::new(r.requested_designation),
                Cell::new(r.primary_designation),
                Cell::new(r.submission_id),
                Cell::new(r.submission_time),
                Cell::new(r.first_submission),
                Cell::new(r.last_submission),
                right(r.num_obs),
                right(format!("{:.3}", r.arc_length_days)),
            ]));
        }
        write!(f, "{table}")
    }
}
