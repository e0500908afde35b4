//! Survey configuration.
//!
//! Configuration is loaded from TOML and only bounds the size of survey
//! inputs. The minimum of two options is an invariant of the survey and is
//! not configurable.
//!
//! ```toml
//! [limits]
//! max_options = 16
//! max_label_length = 128
//! max_question_length = 1024
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of options a survey must have.
pub const MIN_OPTIONS: usize = 2;

/// Default maximum number of options.
pub const DEFAULT_MAX_OPTIONS: usize = 64;

/// Default maximum label length in bytes.
pub const DEFAULT_MAX_LABEL_LENGTH: usize = 256;

/// Default maximum question length in bytes.
pub const DEFAULT_MAX_QUESTION_LENGTH: usize = 4096;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the config file.
    #[error("failed to read config: {0}")]
    Io(#[source] std::io::Error),

    /// TOML parse error.
    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),

    /// Semantic validation error.
    #[error("invalid config: {0}")]
    Validation(String),
}

/// Top-level survey configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SurveyConfig {
    /// Input limits.
    #[serde(default)]
    pub limits: SurveyLimits,
}

impl SurveyConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a limit is out of range.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the offending limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if limits.max_options < MIN_OPTIONS {
            return Err(ConfigError::Validation(format!(
                "limits.max_options must be at least {MIN_OPTIONS}, got {}",
                limits.max_options
            )));
        }
        if limits.max_label_length == 0 {
            return Err(ConfigError::Validation(
                "limits.max_label_length must be at least 1".to_string(),
            ));
        }
        if limits.max_question_length == 0 {
            return Err(ConfigError::Validation(
                "limits.max_question_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bounds on survey inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveyLimits {
    /// Maximum number of options.
    #[serde(default = "default_max_options")]
    pub max_options: usize,

    /// Maximum option label length in bytes.
    #[serde(default = "default_max_label_length")]
    pub max_label_length: usize,

    /// Maximum question length in bytes.
    #[serde(default = "default_max_question_length")]
    pub max_question_length: usize,
}

impl Default for SurveyLimits {
    fn default() -> Self {
        Self {
            max_options: default_max_options(),
            max_label_length: default_max_label_length(),
            max_question_length: default_max_question_length(),
        }
    }
}

const fn default_max_options() -> usize {
    DEFAULT_MAX_OPTIONS
}

const fn default_max_label_length() -> usize {
    DEFAULT_MAX_LABEL_LENGTH
}

const fn default_max_question_length() -> usize {
    DEFAULT_MAX_QUESTION_LENGTH
}
