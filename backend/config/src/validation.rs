//! Config validation with field paths for every finding.

use thiserror::Error;
use url::{Host, Url};

use crate::schema::LabelCheckConfig;

/// A config validation finding with field path and message.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate the effective config and return every error and warning found.
pub fn validate(config: &LabelCheckConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_service(config, &mut report);
    validate_checker(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_service(config: &LabelCheckConfig, report: &mut ValidationReport) {
    match Url::parse(config.base_url()) {
        Ok(url) if url.scheme() == "https" => {}
        Ok(url) if url.scheme() == "http" => {
            if !url.host().is_some_and(is_local) {
                report.warn(
                    "service.baseUrl",
                    "Plain http to a remote host sends label images unencrypted; use https",
                );
            }
        }
        Ok(url) => report.error(
            "service.baseUrl",
            format!("Unsupported scheme '{}'; expected http or https", url.scheme()),
        ),
        Err(e) => report.error("service.baseUrl", format!("Not a valid URL: {e}")),
    }

    if config.timeout().is_zero() {
        report.error("service.timeoutSecs", "timeoutSecs must be > 0");
    }
}

fn is_local(host: Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => domain == "localhost" || domain.ends_with(".localhost"),
        Host::Ipv4(ip) => ip.is_loopback(),
        Host::Ipv6(ip) => ip.is_loopback(),
    }
}

fn validate_checker(config: &LabelCheckConfig, report: &mut ValidationReport) {
    if config.tick_interval().is_zero() {
        report.error("checker.tickIntervalMs", "tickIntervalMs must be > 0");
    }
    let step = config.tick_step();
    let ceiling = config.tick_ceiling();
    if step == 0 {
        report.error("checker.tickStep", "tickStep must be > 0");
    }
    if ceiling >= 100 {
        report.error(
            "checker.tickCeiling",
            "tickCeiling must be below 100; only a finished extraction reports 100",
        );
    }
    if step > ceiling {
        report.warn(
            "checker.tickStep",
            format!("tickStep {step} exceeds tickCeiling {ceiling}; progress jumps straight to the ceiling"),
        );
    }
}

fn validate_logging(config: &LabelCheckConfig, report: &mut ValidationReport) {
    let level = config.log_level().trim();
    if !LEVELS.contains(&level.to_ascii_lowercase().as_str()) && !level.contains('=') {
        report.warn(
            "logging.level",
            format!("Unknown log level '{level}'; expected one of {}", LEVELS.join(", ")),
        );
    }
}
