//! CSV ingestion of observation rows.
//!
//! Rows are read with a header line (see [`ObservationRecord`] for the column
//! names; unknown columns are ignored and optional ones may be absent). A row
//! that cannot be deserialized or validated is rejected on its own and logged;
//! the remaining rows are kept.
use camino::Utf8Path;
use std::{fs::File, io::Read};
use tracing::{debug, warn};

use crate::{
    mpcq_errors::MpcqError,
    observations::{Observation, ObservationRecord},
};

/// A CSV row that was skipped during ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line number in the file (the header is line 1)
    pub line: u64,
    pub obsid: Option<String>,
    pub reason: String,
}

/// Valid observations of a CSV file and the rows that were rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvObservations {
    pub observations: Vec<Observation>,
    pub rejected: Vec<RejectedRow>,
}

type NumberedRecords = Vec<(u64, ObservationRecord)>;

fn read_rows<R: Read>(reader: R) -> Result<(NumberedRecords, Vec<RejectedRow>), MpcqError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    let mut rejected = Vec::new();

    for (idx, result) in csv_reader.records().enumerate() {
        let fallback_line = idx as u64 + 2;
        let row = match result {
            Ok(row) => row,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                let line = err.position().map_or(fallback_line, |p| p.line());
                warn!(line, %err, "Rejected unreadable CSV row");
                rejected.push(RejectedRow {
                    line,
                    obsid: None,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let line = row.position().map_or(fallback_line, |p| p.line());
        match row.deserialize::<ObservationRecord>(Some(&headers)) {
            Ok(record) => rows.push((line, record)),
            Err(err) => {
                warn!(line, %err, "Rejected malformed CSV row");
                rejected.push(RejectedRow {
                    line,
                    obsid: headers
                        .iter()
                        .position(|h| h == "obsid")
                        .and_then(|i| row.get(i))
                        .map(str::to_string),
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok((rows, rejected))
}

/// Read raw observation rows, without validating them.
///
/// Return
/// ------
/// * the deserialized rows and the rows that could not be deserialized
pub fn read_records<R: Read>(
    reader: R,
) -> Result<(Vec<ObservationRecord>, Vec<RejectedRow>), MpcqError> {
    let (rows, rejected) = read_rows(reader)?;
    Ok((rows.into_iter().map(|(_, r)| r).collect(), rejected))
}

/// Read and validate observation rows.
///
/// Arguments
/// ---------
/// * `reader`: CSV content, header line first
///
/// Return
/// ------
/// * the valid observations in file order, plus every rejected row with its reason
/// * an error only when the underlying reader fails or the header cannot be read
pub fn read_observations<R: Read>(reader: R) -> Result<CsvObservations, MpcqError> {
    let (rows, mut rejected) = read_rows(reader)?;

    let mut observations = Vec::with_capacity(rows.len());
    for (line, record) in rows {
        match record.into_observation() {
            Ok(obs) => observations.push(obs),
            Err(err) => {
                warn!(line, obsid = %record.obsid, %err, "Rejected invalid observation");
                rejected.push(RejectedRow {
                    line,
                    obsid: Some(record.obsid),
                    reason: err.to_string(),
                });
            }
        }
    }
    rejected.sort_by_key(|r| r.line);

    debug!(
        valid = observations.len(),
        rejected = rejected.len(),
        "Observation CSV loaded"
    );
    Ok(CsvObservations {
        observations,
        rejected,
    })
}

/// Read and validate observation rows from a CSV file.
pub fn read_observations_file(path: &Utf8Path) -> Result<CsvObservations, MpcqError> {
    let file = File::open(path)?;
    read_observations(file)
}
