//! # Constants and type definitions for mpcq
//!
//! This module centralizes the **unit conversions**, the **default matching tolerances**,
//! and the **common type definitions** used throughout the `mpcq` library.
//!
//! ## Overview
//!
//! - Unit conversions (degrees ↔ arcseconds, days ↔ seconds)
//! - Default tolerances shared by cross-matching and duplicate detection
//! - Core type aliases used across the crate
//! - Identifiers for minor planets ([`Designation`])
//!
//! The default tolerances (30 s, 2.0″) are part of the observable behavior of the
//! crate and are reproduced by [`Tolerance::default`](crate::crossmatch::Tolerance).

use std::convert::Infallible;

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// Number of seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Arcseconds in one degree
pub const ARCSEC_PER_DEG: f64 = 3_600.0;

/// Full circle in degrees, used to wrap right ascension
pub const FULL_CIRCLE_DEG: f64 = 360.0;

// -------------------------------------------------------------------------------------------------
// Matching defaults
// -------------------------------------------------------------------------------------------------

/// Default time tolerance for cross-matching and duplicate detection (seconds)
pub const DEFAULT_TIME_TOLERANCE: Seconds = 30.0;

/// Default angular tolerance for cross-matching and duplicate detection (arcseconds)
pub const DEFAULT_ANGLE_TOLERANCE: ArcSec = 2.0;

/// Two separations closer than this are considered equal by the best-match selector
pub const SEPARATION_TIE_EPS: ArcSec = 1e-9;

/// Submission identifier used by the MPC for historical batches with no recorded submission time
pub const UNKNOWN_SUBMISSION_ID: &str = "00000000";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Time span in seconds
pub type Seconds = f64;
/// MPC code identifying an observatory (3 characters)
pub type MpcCode = String;
/// Identifier of a batch of observations reported together
pub type SubmissionId = String;

// -------------------------------------------------------------------------------------------------
// Identifiers
// -------------------------------------------------------------------------------------------------

/// Designation of a minor planet.
///
/// This can be:
/// - A permanent number (e.g. `Permanent(433)`)
/// - A provisional designation (e.g. `"2022 AJ2"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Designation {
    /// Numbered object (permid)
    Permanent(u32),
    /// Provisional designation (provid)
    Provisional(String),
}

impl Designation {
    /// Check whether a raw designation string, as found in a warehouse row,
    /// refers to this object.
    pub fn matches(&self, raw: &str) -> bool {
        *self == Designation::from(raw)
    }
}

impl std::fmt::Display for Designation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Designation::Permanent(n) => write!(f, "{n}"),
            Designation::Provisional(s) => write!(f, "{s}"),
        }
    }
}

impl From<u32> for Designation {
    fn from(n: u32) -> Self {
        Designation::Permanent(n)
    }
}

impl From<&str> for Designation {
    /// Pure digits that fit a `u32` → `Permanent`, anything else → `Provisional`.
    fn from(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<u32>() {
            Ok(n) if s.chars().all(|c| c.is_ascii_digit()) => Designation::Permanent(n),
            _ => Designation::Provisional(s.to_string()),
        }
    }
}

impl From<String> for Designation {
    fn from(s: String) -> Self {
        Designation::from(s.as_str())
    }
}

impl std::str::FromStr for Designation {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Designation::from(s))
    }
}

#[cfg(test)]
mod constants_test {
    use super::*;

    #[test]
    fn test_designation_from_str() {
        assert_eq!(Designation::from("433"), Designation::Permanent(433));
        assert_eq!(
            Designation::from("2022 AJ2"),
            Designation::Provisional("2022 AJ2".into())
        );
        assert_eq!(Designation::from(" 1 "), Designation::Permanent(1));
        // Leading sign is not a numbered object
        assert_eq!(
            Designation::from("+12"),
            Designation::Provisional("+12".into())
        );
        // Overflowing numbers stay provisional
        assert_eq!(
            Designation::from("99999999999"),
            Designation::Provisional("99999999999".into())
        );
    }

    #[test]
    fn test_designation_matches_and_display() {
        let d = Designation::from("2013 RR165");
        assert!(d.matches("2013 RR165"));
        assert!(!d.matches("2013 RR166"));
        assert_eq!(d.to_string(), "2013 RR165");
        assert_eq!(Designation::Permanent(8467).to_string(), "8467");
    }
}
