//! `labelcheck-config`: runtime configuration for the label checker.
//!
//! Provides:
//! - Typed config schema with camelCase YAML keys
//! - Config directory discovery and YAML loading
//! - `LABELCHECK_*` environment overrides
//! - Default value application
//! - Validation with field paths

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, apply_env_overrides_with};
pub use io::{config_dir, config_file_path, load_config};
pub use schema::LabelCheckConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::Result;
use std::path::Path;

/// Load a config file, apply environment overrides, then defaults.
///
/// Validation is left to the caller so it can run after logging is set up.
pub async fn load_and_prepare(path: &Path) -> Result<LabelCheckConfig> {
    let config = load_config(path).await?;
    let config = apply_env_overrides(config)?;
    Ok(apply_all_defaults(config))
}

/// Log every validation finding; returns the report for callers that
/// want to refuse to start on errors.
pub fn log_validation(config: &LabelCheckConfig) -> ValidationReport {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    report
}
