//! # mpcq
//!
//! Cross-matching and duplicate detection for Minor Planet Center astrometric
//! observations.
//!
//! * [`crossmatch::cross_match`] finds, for each input observation, the reference
//!   observation that records the same detection event under a time and an
//!   angular tolerance.
//! * [`duplicates::find_duplicates`] groups an object's observations that were
//!   reported more than once across submissions.
//! * [`Mpcq`] runs both over an [`ObservationSource`], one object at a time on a
//!   worker pool, with per-object error isolation and cooperative cancellation.
pub mod config;
pub mod constants;
pub mod crossmatch;
pub mod duplicates;
pub mod fetch;
pub mod geometry;
pub mod mpcq;
pub mod mpcq_errors;
pub mod observations;
mod progress_bar;
pub mod submissions;
pub mod time;

pub use crate::config::MpcqConfig;
pub use crate::constants::Designation;
pub use crate::crossmatch::{MatchResult, Tolerance};
pub use crate::duplicates::DuplicateGroup;
pub use crate::fetch::{InMemorySource, ObservationSource, TimeRange};
pub use crate::mpcq::{CrossMatchReport, Mpcq, ObjectOutcome, ObjectResults};
pub use crate::mpcq_errors::{MpcqError, ValidationError};
pub use crate::observations::Observation;
