//! Serializable normalization run configuration.
//!
//! Loaded from a TOML file; every field is optional:
//!
//! ```toml
//! origin = "2010-10-01"
//! threads = 8
//! failure_policy = "skip"      # or "abort"
//! trim_to_review_start = false
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use revseries_core::domain::{month_start_of, DEFAULT_ORIGIN};
use revseries_core::{Calendar, SeriesError};

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("cannot build calendar: {0}")]
    Calendar(#[from] SeriesError),
}

/// What a batch does when one product fails to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure, leave the product out, keep going.
    #[default]
    Skip,
    /// Fail the whole batch on the first failing product.
    Abort,
}

/// Configuration for one normalization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    /// First calendar month; any day in the month is accepted.
    pub origin: NaiveDate,

    /// Worker threads for the batch. 1 runs sequentially.
    pub threads: usize,

    pub failure_policy: FailurePolicy,

    /// Drop months before each product's resolved review start.
    pub trim_to_review_start: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            origin: DateTime::from_timestamp(DEFAULT_ORIGIN, 0)
                .map(|dt| dt.date_naive())
                .unwrap_or_default(),
            threads: 1,
            failure_policy: FailurePolicy::Skip,
            trim_to_review_start: false,
        }
    }
}

impl NormalizeConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Invalid("threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Calendar origin as a month-start timestamp.
    pub fn origin_timestamp(&self) -> Result<i64, ConfigError> {
        Ok(month_start_of(self.origin)?)
    }

    /// Build the run's calendar snapshot, through the month containing `now`.
    pub fn calendar(&self, now: DateTime<Utc>) -> Result<Calendar, ConfigError> {
        Ok(Calendar::generate(self.origin_timestamp()?, now)?)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            threads: self.threads,
            failure_policy: self.failure_policy,
            trim_to_review_start: self.trim_to_review_start,
        }
    }
}

/// Options controlling how a batch is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub threads: usize,
    pub failure_policy: FailurePolicy,
    pub trim_to_review_start: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        NormalizeConfig::default().batch_options()
    }
}
