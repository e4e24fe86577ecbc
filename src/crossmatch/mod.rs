//! # Cross-matching
//!
//! Find, for every input observation, the reference observation that records the
//! same detection event, if any.
//!
//! ## Pipeline
//! -----------------
//! ```text
//! windower (ObservationSet::window) → matcher → selector → assembler
//! ```
//!
//! * The **windower** narrows the time-sorted reference set to the rows within
//!   the time tolerance of the input.
//! * The **matcher** ([`matcher`]) keeps the windowed rows that satisfy both the
//!   time and the angular tolerance, as borrowed [`MatchCandidate`]s.
//! * The **selector** ([`selector`]) picks at most one candidate per input.
//! * The **assembler** ([`cross_match`]) turns the selection into one owned
//!   [`MatchResult`] per input, in input order.
//!
//! ## Semantics
//! -----------------
//! * Both tolerances are inclusive; a zero tolerance means exact equality.
//! * A reference row can be selected by several inputs (many-to-one). This is
//!   reported as is, never treated as an error.
//! * Matching is pure: the same inputs and reference always give the same results.
pub mod matcher;
pub mod selector;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering::{Equal, Greater};
use std::fmt;

use crate::{
    constants::{ArcSec, Seconds, DEFAULT_ANGLE_TOLERANCE, DEFAULT_TIME_TOLERANCE},
    mpcq_errors::MpcqError,
    observations::{observation_set::ObservationSet, Observation},
};

use self::{matcher::qualifying_candidates, selector::select_best};

/// Time and angular tolerances for deciding that two observations are the same event.
///
/// Both values are finite and non-negative. The defaults are 30 seconds and
/// 2.0 arcseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToleranceValues", into = "ToleranceValues")]
pub struct Tolerance {
    time_tolerance_seconds: Seconds,
    angle_tolerance_arcsec: ArcSec,
}

/// Unchecked tolerance values, as found in a configuration file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct ToleranceValues {
    time_tolerance_seconds: Seconds,
    angle_tolerance_arcsec: ArcSec,
}

impl Default for ToleranceValues {
    fn default() -> Self {
        ToleranceValues {
            time_tolerance_seconds: DEFAULT_TIME_TOLERANCE,
            angle_tolerance_arcsec: DEFAULT_ANGLE_TOLERANCE,
        }
    }
}

impl TryFrom<ToleranceValues> for Tolerance {
    type Error = MpcqError;

    fn try_from(v: ToleranceValues) -> Result<Self, Self::Error> {
        Tolerance::new(v.time_tolerance_seconds, v.angle_tolerance_arcsec)
    }
}

impl From<Tolerance> for ToleranceValues {
    fn from(t: Tolerance) -> Self {
        ToleranceValues {
            time_tolerance_seconds: t.time_tolerance_seconds,
            angle_tolerance_arcsec: t.angle_tolerance_arcsec,
        }
    }
}

impl Tolerance {
    /// Create a validated tolerance.
    ///
    /// Arguments
    /// ---------
    /// * `time_tolerance_seconds`: maximum absolute time difference, in seconds
    /// * `angle_tolerance_arcsec`: maximum angular separation, in arcseconds
    ///
    /// Return
    /// ------
    /// * the tolerance, or [`MpcqError::InvalidTolerance`] when a value is negative,
    ///   infinite or NaN
    pub fn new(
        time_tolerance_seconds: Seconds,
        angle_tolerance_arcsec: ArcSec,
    ) -> Result<Self, MpcqError> {
        if !Self::finite_ge0(time_tolerance_seconds) {
            return Err(MpcqError::InvalidTolerance(format!(
                "time tolerance must be finite and non-negative, got {time_tolerance_seconds}"
            )));
        }
        if !Self::finite_ge0(angle_tolerance_arcsec) {
            return Err(MpcqError::InvalidTolerance(format!(
                "angle tolerance must be finite and non-negative, got {angle_tolerance_arcsec}"
            )));
        }
        Ok(Tolerance {
            time_tolerance_seconds,
            angle_tolerance_arcsec,
        })
    }

    pub fn builder() -> ToleranceBuilder {
        ToleranceBuilder::new()
    }

    pub fn time_tolerance_seconds(&self) -> Seconds {
        self.time_tolerance_seconds
    }

    pub fn angle_tolerance_arcsec(&self) -> ArcSec {
        self.angle_tolerance_arcsec
    }

    #[inline]
    fn finite_ge0(x: f64) -> bool {
        x.is_finite() && matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            time_tolerance_seconds: DEFAULT_TIME_TOLERANCE,
            angle_tolerance_arcsec: DEFAULT_ANGLE_TOLERANCE,
        }
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Δt ≤ {} s, separation ≤ {}″",
            self.time_tolerance_seconds, self.angle_tolerance_arcsec
        )
    }
}

/// Builder for [`Tolerance`], starting from the defaults.
#[derive(Debug, Clone, Default)]
pub struct ToleranceBuilder {
    values: ToleranceValues,
}

impl ToleranceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_tolerance_seconds(mut self, v: Seconds) -> Self {
        self.values.time_tolerance_seconds = v;
        self
    }

    pub fn angle_tolerance_arcsec(mut self, v: ArcSec) -> Self {
        self.values.angle_tolerance_arcsec = v;
        self
    }

    pub fn build(self) -> Result<Tolerance, MpcqError> {
        Tolerance::try_from(self.values)
    }
}

/// A reference observation that satisfies both tolerances for one input.
///
/// Candidates borrow the two observations: they are produced by the matcher,
/// consumed by the selector and never outlive a single cross-match call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate<'a> {
    pub input: &'a Observation,
    pub reference: &'a Observation,
    pub delta_time_seconds: Seconds,
    pub separation_arcsec: ArcSec,
}

/// Outcome of cross-matching one input observation.
///
/// `reference`, `separation_arcsec` and `separation_seconds` are all `Some`
/// when a match was selected and all `None` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub input: Observation,
    pub reference: Option<Observation>,
    pub separation_arcsec: Option<ArcSec>,
    pub separation_seconds: Option<Seconds>,
}

impl MatchResult {
    /// Result for an input with no qualifying reference observation.
    pub fn unmatched(input: Observation) -> Self {
        MatchResult {
            input,
            reference: None,
            separation_arcsec: None,
            separation_seconds: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.reference.is_some()
    }

    pub fn reference_id(&self) -> Option<&str> {
        self.reference.as_ref().map(Observation::obs_id)
    }
}

impl From<&MatchCandidate<'_>> for MatchResult {
    fn from(candidate: &MatchCandidate<'_>) -> Self {
        MatchResult {
            input: candidate.input.clone(),
            reference: Some(candidate.reference.clone()),
            separation_arcsec: Some(candidate.separation_arcsec),
            separation_seconds: Some(candidate.delta_time_seconds),
        }
    }
}

/// Cross-match every input against a reference set.
///
/// Arguments
/// -----------------
/// * `inputs`: the observations to match, in caller order
/// * `reference`: the time-sorted reference observations
/// * `tolerance`: the joint time / angle tolerance
///
/// Return
/// ----------
/// * exactly one [`MatchResult`] per input, in input order
///
/// See also
/// ------------
/// * [`matcher::qualifying_candidates`] – tolerance evaluation over a window.
/// * [`selector::select_best`] – tie-breaking between qualifying candidates.
pub fn cross_match(
    inputs: &[Observation],
    reference: &ObservationSet,
    tolerance: &Tolerance,
) -> Vec<MatchResult> {
    inputs
        .iter()
        .map(|input| {
            let window = reference.window(input.obstime(), tolerance.time_tolerance_seconds());
            let candidates = qualifying_candidates(input, window, tolerance);
            match select_best(&candidates) {
                Some(best) => MatchResult::from(best),
                None => MatchResult::unmatched(input.clone()),
            }
        })
        .collect()
}
