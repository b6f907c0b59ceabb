//! Config defaults applied after loading.

use crate::schema::{CheckerConfig, LabelCheckConfig, LoggingConfig, ServiceConfig};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Validation can take a while on large scans.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_USER_AGENT: &str = concat!("labelcheck/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 200;
pub const DEFAULT_TICK_STEP: u8 = 10;
pub const DEFAULT_TICK_CEILING: u8 = 90;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Fill every unset field so the effective config can be shown in full.
pub fn apply_all_defaults(config: LabelCheckConfig) -> LabelCheckConfig {
    let config = apply_service_defaults(config);
    let config = apply_checker_defaults(config);
    apply_logging_defaults(config)
}

fn apply_service_defaults(mut config: LabelCheckConfig) -> LabelCheckConfig {
    let service = config.service.get_or_insert_with(ServiceConfig::default);
    service.base_url.get_or_insert_with(|| DEFAULT_BASE_URL.to_string());
    service.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    service.user_agent.get_or_insert_with(|| DEFAULT_USER_AGENT.to_string());
    config
}

fn apply_checker_defaults(mut config: LabelCheckConfig) -> LabelCheckConfig {
    let checker = config.checker.get_or_insert_with(CheckerConfig::default);
    checker.tick_interval_ms.get_or_insert(DEFAULT_TICK_INTERVAL_MS);
    checker.tick_step.get_or_insert(DEFAULT_TICK_STEP);
    checker.tick_ceiling.get_or_insert(DEFAULT_TICK_CEILING);
    checker.locale.get_or_insert_with(Default::default);
    config
}

fn apply_logging_defaults(mut config: LabelCheckConfig) -> LabelCheckConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelcheck_core::Locale;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = apply_all_defaults(LabelCheckConfig::default());
        let service = config.service.as_ref().unwrap();
        assert_eq!(service.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(service.timeout_secs, Some(120));
        let checker = config.checker.as_ref().unwrap();
        assert_eq!(checker.tick_step, Some(10));
        assert_eq!(checker.tick_ceiling, Some(90));
        assert_eq!(checker.locale, Some(Locale::Uk));
        assert!(config.logging.as_ref().unwrap().dir.is_none());
    }

    #[test]
    fn test_defaults_keep_explicit_values() {
        let config = LabelCheckConfig {
            service: Some(ServiceConfig {
                timeout_secs: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = apply_all_defaults(config);
        assert_eq!(config.timeout().as_secs(), 5);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }
}
