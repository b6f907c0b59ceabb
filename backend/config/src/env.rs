//! Environment overrides, applied on top of the config file.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use labelcheck_core::Locale;

use crate::schema::{CheckerConfig, LabelCheckConfig, LoggingConfig, ServiceConfig};

pub const ENV_API_URL: &str = "LABELCHECK_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "LABELCHECK_TIMEOUT_SECS";
pub const ENV_LOCALE: &str = "LABELCHECK_LOCALE";
pub const ENV_LOG_LEVEL: &str = "LABELCHECK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LABELCHECK_LOG_DIR";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: LabelCheckConfig) -> Result<LabelCheckConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing). Empty values
/// are ignored.
pub fn apply_env_overrides_with(
    mut config: LabelCheckConfig,
    env: &HashMap<String, String>,
) -> Result<LabelCheckConfig> {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(url) = get(ENV_API_URL) {
        service(&mut config).base_url = Some(url.to_string());
    }
    if let Some(secs) = get(ENV_TIMEOUT_SECS) {
        let secs: u64 = secs
            .parse()
            .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {secs:?}"))?;
        service(&mut config).timeout_secs = Some(secs);
    }
    if let Some(locale) = get(ENV_LOCALE) {
        let locale: Locale = locale
            .parse()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Invalid {ENV_LOCALE}"))?;
        config.checker.get_or_insert_with(CheckerConfig::default).locale = Some(locale);
    }
    if let Some(level) = get(ENV_LOG_LEVEL) {
        logging(&mut config).level = Some(level.to_string());
    }
    if let Some(dir) = get(ENV_LOG_DIR) {
        logging(&mut config).dir = Some(PathBuf::from(dir));
    }

    Ok(config)
}

fn service(config: &mut LabelCheckConfig) -> &mut ServiceConfig {
    config.service.get_or_insert_with(ServiceConfig::default)
}

fn logging(config: &mut LabelCheckConfig) -> &mut LoggingConfig {
    config.logging.get_or_insert_with(LoggingConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn overrides_file_values() {
        let config = LabelCheckConfig {
            service: Some(ServiceConfig {
                base_url: Some("http://file.example".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let env = env(&[
            (ENV_API_URL, "https://api.example.com"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_LOCALE, "en"),
            (ENV_LOG_DIR, "/tmp/labelcheck"),
        ]);
        let config = apply_env_overrides_with(config, &env).unwrap();
        assert_eq!(config.base_url(), "https://api.example.com");
        assert_eq!(config.timeout().as_secs(), 15);
        assert_eq!(config.locale(), Locale::En);
        assert_eq!(config.log_dir(), Some(std::path::Path::new("/tmp/labelcheck")));
    }

    #[test]
    fn ignores_empty_values() {
        let env = env(&[(ENV_API_URL, "  "), (ENV_LOG_LEVEL, "")]);
        let config = apply_env_overrides_with(LabelCheckConfig::default(), &env).unwrap();
        assert_eq!(config, LabelCheckConfig::default());
    }

    #[test]
    fn error_on_bad_timeout() {
        let env = env(&[(ENV_TIMEOUT_SECS, "soon")]);
        let err = apply_env_overrides_with(LabelCheckConfig::default(), &env).unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));
    }

    #[test]
    fn error_on_unknown_locale() {
        let env = env(&[(ENV_LOCALE, "fr")]);
        assert!(apply_env_overrides_with(LabelCheckConfig::default(), &env).is_err());
    }
}
