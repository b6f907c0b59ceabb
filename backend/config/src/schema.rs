//! LabelCheck configuration schema.
//!
//! Every field is optional in the file; [`crate::defaults`] fills the gaps
//! and the accessors below fall back to the same defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use labelcheck_core::Locale;

use crate::defaults::{
    DEFAULT_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_TICK_CEILING, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TICK_STEP,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};

/// Root configuration (`config.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelCheckConfig {
    /// Remote check service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceConfig>,

    /// Pipeline behaviour and presentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker: Option<CheckerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_step: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_ceiling: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Level or `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rotating JSON log; console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl LabelCheckConfig {
    pub fn base_url(&self) -> &str {
        self.service
            .as_ref()
            .and_then(|s| s.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        let secs = self
            .service
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn user_agent(&self) -> &str {
        self.service
            .as_ref()
            .and_then(|s| s.user_agent.as_deref())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn tick_interval(&self) -> Duration {
        let ms = self
            .checker
            .as_ref()
            .and_then(|c| c.tick_interval_ms)
            .unwrap_or(DEFAULT_TICK_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    pub fn tick_step(&self) -> u8 {
        self.checker.as_ref().and_then(|c| c.tick_step).unwrap_or(DEFAULT_TICK_STEP)
    }

    pub fn tick_ceiling(&self) -> u8 {
        self.checker
            .as_ref()
            .and_then(|c| c.tick_ceiling)
            .unwrap_or(DEFAULT_TICK_CEILING)
    }

    pub fn locale(&self) -> Locale {
        self.checker.as_ref().and_then(|c| c.locale).unwrap_or_default()
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.logging.as_ref().and_then(|l| l.dir.as_deref())
    }
}
