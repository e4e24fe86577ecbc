//! # Configuration
//!
//! [`MpcqConfig`] gathers the matching tolerances and the engine settings. It is
//! read from a TOML file in which every section and key is optional:
//!
//! ```toml
//! [crossmatch]
//! time_tolerance_seconds = 30.0
//! angle_tolerance_arcsec = 2.0
//!
//! [duplicates]
//! time_tolerance_seconds = 30.0
//! angle_tolerance_arcsec = 2.0
//!
//! [engine]
//! workers = 0   # 0 = one worker per logical CPU
//! ```
//!
//! Tolerances are validated while the file is parsed, so a negative or
//! non-finite value is reported as a parse error.
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::{crossmatch::Tolerance, mpcq_errors::MpcqError};

/// Worker pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker threads for per-object processing; `0` lets rayon decide
    pub workers: usize,
}

/// Complete configuration of an [`Mpcq`](crate::mpcq::Mpcq) engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MpcqConfig {
    /// Tolerance used by cross-matching
    pub crossmatch: Tolerance,
    /// Tolerance used by duplicate detection
    pub duplicates: Tolerance,
    pub engine: EngineConfig,
}

impl MpcqConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, MpcqError> {
        Ok(toml::from_str(content)?)
    }

    /// Load the configuration from a TOML file.
    ///
    /// Return
    /// ------
    /// * the configuration, missing keys taking their default values
    /// * [`MpcqError::IoError`] if the file cannot be read,
    ///   [`MpcqError::ConfigParse`] if it is not valid TOML or holds an invalid tolerance
    pub fn from_file(path: &Utf8Path) -> Result<Self, MpcqError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, MpcqError> {
        toml::to_string(self).map_err(|e| MpcqError::Config(e.to_string()))
    }

    pub fn with_crossmatch_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.crossmatch = tolerance;
        self
    }

    pub fn with_duplicate_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.duplicates = tolerance;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.engine.workers = workers;
        self
    }
}
