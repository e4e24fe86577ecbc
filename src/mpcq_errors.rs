use thiserror::Error;

use crate::constants::Designation;

/// Reasons a single observation row is rejected at construction.
///
/// A validation failure only excludes the offending row: the rest of the
/// object's observations are still matched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Right ascension out of range [0, 360]: {0}")]
    RaOutOfRange(f64),
    #[error("Declination out of range [-90, 90]: {0}")]
    DecOutOfRange(f64),
    #[error("Missing observation timestamp")]
    MissingTimestamp,
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Error, Debug)]
pub enum MpcqError {
    #[error("Fetch failed for {designation}: {reason}")]
    Fetch {
        designation: Designation,
        reason: String,
    },

    #[error("Invalid observation: {0}")]
    Validation(#[from] ValidationError),

    #[error("No designations or observations were supplied")]
    EmptyInput,

    #[error("Invalid tolerance: {0}")]
    InvalidTolerance(String),

    #[error("Processing cancelled before this object was started")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unable to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unable to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl PartialEq for MpcqError {
    fn eq(&self, other: &Self) -> bool {
        use MpcqError::*;
        match (self, other) {
            (
                Fetch {
                    designation: a,
                    reason: ra,
                },
                Fetch {
                    designation: b,
                    reason: rb,
                },
            ) => a == b && ra == rb,
            (Validation(a), Validation(b)) => a == b,
            (InvalidTolerance(a), InvalidTolerance(b)) => a == b,
            (Config(a), Config(b)) => a == b,

            // Not comparable: equal if same variant
            (ConfigParse(_), ConfigParse(_)) => true,
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (JsonError(_), JsonError(_)) => true,
            (ThreadPool(_), ThreadPool(_)) => true,

            (EmptyInput, EmptyInput) => true,
            (Cancelled, Cancelled) => true,

            _ => false,
        }
    }
}

#[cfg(test)]
mod mpcq_errors_test {
    use super::*;

    #[test]
    fn test_error_equality_by_variant() {
        assert_eq!(MpcqError::EmptyInput, MpcqError::EmptyInput);
        assert_ne!(MpcqError::EmptyInput, MpcqError::Cancelled);
        assert_eq!(
            MpcqError::from(ValidationError::DecOutOfRange(91.0)),
            MpcqError::Validation(ValidationError::DecOutOfRange(91.0))
        );

        let a = MpcqError::Fetch {
            designation: Designation::from("2022 AJ2"),
            reason: "timeout".into(),
        };
        let b = MpcqError::Fetch {
            designation: Designation::from("2022 AJ2"),
            reason: "quota".into(),
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_error_messages() {
        let err = MpcqError::Fetch {
            designation: Designation::Permanent(433),
            reason: "connection reset".into(),
        };
        assert_eq!(err.to_string(), "Fetch failed for 433: connection reset");
        assert_eq!(
            ValidationError::RaOutOfRange(-1.0).to_string(),
            "Right ascension out of range [0, 360]: -1"
        );
    }
}
