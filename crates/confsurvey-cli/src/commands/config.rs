//! `confsurvey check-config`: validate a survey configuration file.

use std::path::Path;

use anyhow::{Context, Result};
use confsurvey_core::SurveyConfig;

/// Loads and validates `path`, returning the effective configuration as
/// TOML (defaults filled in).
pub fn check(path: &Path) -> Result<String> {
    let config = SurveyConfig::from_file(path)
        .with_context(|| format!("config '{}' is invalid", path.display()))?;
    config
        .to_toml()
        .context("failed to render effective config")
}
