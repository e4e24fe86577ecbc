//! # Astrometric observations
//!
//! Core record types shared by cross-matching, duplicate detection and the
//! fetch layer.
//!
//! ## Overview
//! -----------------
//! * [`Observation`] – one validated astrometric measurement, immutable once built.
//! * [`ObservationBuilder`] – the only way to construct an [`Observation`]; range
//!   checks are applied in [`ObservationBuilder::build`].
//! * [`ObservationRecord`] – the raw, serde-deserializable row as delivered by a
//!   warehouse export or a CSV file, validated into an [`Observation`].
//! * [`ObservationStatus`] – publication status carried through untouched.
//!
//! Sub-modules:
//! * [`observation_set`] – time-sorted container and the candidate windower,
//! * [`csv_reader`] – CSV ingestion with per-row rejection,
//! * [`display`] – tabular and JSON rendering.
pub mod csv_reader;
pub mod display;
pub mod observation_set;

use hifitime::Epoch;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{
    constants::{Degree, Designation, MpcCode, SubmissionId, FULL_CIRCLE_DEG},
    mpcq_errors::ValidationError,
    time::{format_timestamp, parse_optional_timestamp, parse_timestamp},
};

/// Publication status of an observation in the MPC database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationStatus {
    Published,
    Pending,
    Rejected,
    Unknown(String),
}

impl ObservationStatus {
    /// Interpret a raw status cell. One-letter MPC codes and full words are accepted.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "P" => ObservationStatus::Published,
            "X" => ObservationStatus::Rejected,
            s if s.eq_ignore_ascii_case("published") => ObservationStatus::Published,
            s if s.eq_ignore_ascii_case("pending") => ObservationStatus::Pending,
            s if s.eq_ignore_ascii_case("rejected") => ObservationStatus::Rejected,
            s => ObservationStatus::Unknown(s.to_string()),
        }
    }
}

impl std::fmt::Display for ObservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObservationStatus::Published => write!(f, "published"),
            ObservationStatus::Pending => write!(f, "pending"),
            ObservationStatus::Rejected => write!(f, "rejected"),
            ObservationStatus::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// Optional metadata attached to an observation.
///
/// None of these fields take part in matching; they are carried from the
/// source row to the results so callers can inspect them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationMetadata {
    pub trksub: Option<String>,
    pub obssubid: Option<String>,
    pub mag: Option<f64>,
    pub rmsra: Option<f64>,
    pub rmsdec: Option<f64>,
    pub band: Option<String>,
    pub status: Option<ObservationStatus>,
}

/// A validated astrometric observation.
///
/// # Fields
///
/// * `obs_id` - unique observation identifier (MPC `obsid`)
/// * `designation` - the object the observation was attributed to
/// * `obstime` - observation timestamp (UTC, sub-second precision)
/// * `ra` - right ascension in degrees, in [0, 360)
/// * `dec` - declination in degrees, in [-90, 90]
/// * `stn` - MPC observatory code
/// * `submission_id` - identifier of the batch this row was reported in
/// * `created_at` - record creation timestamp, when known
///
/// The fields are private: an `Observation` can only be obtained through
/// [`Observation::builder`], which enforces the coordinate ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    obs_id: String,
    designation: Designation,
    obstime: Epoch,
    ra: Degree,
    dec: Degree,
    stn: MpcCode,
    submission_id: SubmissionId,
    created_at: Option<Epoch>,
    metadata: ObservationMetadata,
}

impl Observation {
    /// Start building an observation from its mandatory fields.
    ///
    /// Arguments
    /// ---------
    /// * `obs_id`: the observation identifier
    /// * `designation`: the object designation
    /// * `obstime`: the observation timestamp
    /// * `ra`, `dec`: the measured position in degrees
    ///
    /// Return
    /// ------
    /// * an [`ObservationBuilder`]; call [`ObservationBuilder::build`] to validate it.
    pub fn builder(
        obs_id: impl Into<String>,
        designation: impl Into<Designation>,
        obstime: Epoch,
        ra: Degree,
        dec: Degree,
    ) -> ObservationBuilder {
        ObservationBuilder {
            obs_id: obs_id.into(),
            designation: designation.into(),
            obstime,
            ra,
            dec,
            stn: String::new(),
            submission_id: String::new(),
            created_at: None,
            metadata: ObservationMetadata::default(),
        }
    }

    pub fn obs_id(&self) -> &str {
        &self.obs_id
    }

    pub fn designation(&self) -> &Designation {
        &self.designation
    }

    pub fn obstime(&self) -> Epoch {
        self.obstime
    }

    pub fn ra(&self) -> Degree {
        self.ra
    }

    pub fn dec(&self) -> Degree {
        self.dec
    }

    pub fn stn(&self) -> &str {
        &self.stn
    }

    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    pub fn created_at(&self) -> Option<Epoch> {
        self.created_at
    }

    pub fn metadata(&self) -> &ObservationMetadata {
        &self.metadata
    }
}

/// Builder for [`Observation`].
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    obs_id: String,
    designation: Designation,
    obstime: Epoch,
    ra: Degree,
    dec: Degree,
    stn: MpcCode,
    submission_id: SubmissionId,
    created_at: Option<Epoch>,
    metadata: ObservationMetadata,
}

impl ObservationBuilder {
    pub fn stn(mut self, stn: impl Into<MpcCode>) -> Self {
        self.stn = stn.into();
        self
    }

    pub fn submission_id(mut self, submission_id: impl Into<SubmissionId>) -> Self {
        self.submission_id = submission_id.into();
        self
    }

    pub fn created_at(mut self, created_at: Option<Epoch>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn metadata(mut self, metadata: ObservationMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Validate and build the observation.
    ///
    /// Return
    /// ------
    /// * the immutable [`Observation`], with `ra == 360` folded to `0`
    /// * [`ValidationError::MissingField`] for an empty identifier,
    ///   [`ValidationError::RaOutOfRange`] / [`ValidationError::DecOutOfRange`]
    ///   for non-finite or out-of-range coordinates
    pub fn build(self) -> Result<Observation, ValidationError> {
        if self.obs_id.trim().is_empty() {
            return Err(ValidationError::MissingField("obsid"));
        }
        if !self.ra.is_finite() || !(0.0..=FULL_CIRCLE_DEG).contains(&self.ra) {
            return Err(ValidationError::RaOutOfRange(self.ra));
        }
        if !self.dec.is_finite() || !(-90.0..=90.0).contains(&self.dec) {
            return Err(ValidationError::DecOutOfRange(self.dec));
        }

        let ra = if self.ra == FULL_CIRCLE_DEG { 0.0 } else { self.ra };

        Ok(Observation {
            obs_id: self.obs_id,
            designation: self.designation,
            obstime: self.obstime,
            ra,
            dec: self.dec,
            stn: self.stn,
            submission_id: self.submission_id,
            created_at: self.created_at,
            metadata: self.metadata,
        })
    }
}

/// Raw observation row as found in a warehouse export or a CSV file.
///
/// Every field except the identifiers is optional at this stage; missing or
/// malformed values are reported by [`ObservationRecord::into_observation`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub obsid: String,
    pub designation: String,
    #[serde(default)]
    pub obstime: Option<String>,
    #[serde(default)]
    pub ra: Option<f64>,
    #[serde(default)]
    pub dec: Option<f64>,
    #[serde(default)]
    pub stn: Option<String>,
    #[serde(default)]
    pub submission_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub trksub: Option<String>,
    #[serde(default)]
    pub obssubid: Option<String>,
    #[serde(default)]
    pub mag: Option<f64>,
    #[serde(default)]
    pub rmsra: Option<f64>,
    #[serde(default)]
    pub rmsdec: Option<f64>,
    #[serde(default)]
    pub band: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn non_empty(cell: &Option<String>) -> Option<String> {
    cell.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ObservationRecord {
    /// Validate the raw row into an [`Observation`].
    pub fn into_observation(&self) -> Result<Observation, ValidationError> {
        if self.designation.trim().is_empty() {
            return Err(ValidationError::MissingField("designation"));
        }
        let obstime = parse_timestamp(self.obstime.as_deref().unwrap_or_default())?;
        let ra = self.ra.ok_or(ValidationError::MissingField("ra"))?;
        let dec = self.dec.ok_or(ValidationError::MissingField("dec"))?;
        let created_at = parse_optional_timestamp(self.created_at.as_deref())?;

        let metadata = ObservationMetadata {
            trksub: non_empty(&self.trksub),
            obssubid: non_empty(&self.obssubid),
            mag: self.mag,
            rmsra: self.rmsra,
            rmsdec: self.rmsdec,
            band: non_empty(&self.band),
            status: non_empty(&self.status).map(|s| ObservationStatus::parse(&s)),
        };

        Observation::builder(
            self.obsid.trim(),
            self.designation.as_str(),
            obstime,
            ra,
            dec,
        )
        .stn(non_empty(&self.stn).unwrap_or_default())
        .submission_id(non_empty(&self.submission_id).unwrap_or_default())
        .created_at(created_at)
        .metadata(metadata)
        .build()
    }
}

impl From<&Observation> for ObservationRecord {
    fn from(obs: &Observation) -> Self {
        let meta = obs.metadata();
        let cell = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ObservationRecord {
            obsid: obs.obs_id.clone(),
            designation: obs.designation.to_string(),
            obstime: Some(format_timestamp(&obs.obstime)),
            ra: Some(obs.ra),
            dec: Some(obs.dec),
            stn: cell(&obs.stn),
            submission_id: cell(&obs.submission_id),
            created_at: obs.created_at.as_ref().map(format_timestamp),
            trksub: meta.trksub.clone(),
            obssubid: meta.obssubid.clone(),
            mag: meta.mag,
            rmsra: meta.rmsra,
            rmsdec: meta.rmsdec,
            band: meta.band.clone(),
            status: meta.status.as_ref().map(ToString::to_string),
        }
    }
}

/// Order two observation identifiers.
///
/// Integer identifiers come first, by value, then every other identifier in
/// lexicographic order. Ties between integers of equal value (`"007"`, `"7"`)
/// fall back to the string itself, so the order is total.
pub fn compare_observation_ids(a: &str, b: &str) -> Ordering {
    id_sort_key(a).cmp(&id_sort_key(b))
}

fn id_sort_key(id: &str) -> (bool, u64, &str) {
    match id.parse::<u64>() {
        Ok(n) => (false, n, id),
        Err(_) => (true, 0, id),
    }
}
