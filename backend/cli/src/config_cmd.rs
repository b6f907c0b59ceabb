//! `labelcheck config`: show what the checker will actually use.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use labelcheck_config::{LabelCheckConfig, ValidationReport};

use crate::terminal_output::{note_error, note_info, note_success, note_warn};

pub fn run(config: &LabelCheckConfig, path: &Path, report: &ValidationReport) -> Result<ExitCode> {
    note_info(&format!("Config file: {}", path.display()));

    let yaml = serde_yaml::to_string(config).context("Failed to render config")?;
    print!("{yaml}");

    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }

    if report.is_valid() {
        note_success("Configuration is valid");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}
