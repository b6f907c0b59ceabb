//! User-facing vocabulary. Raw transport or server text never ends up here.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::intake::IntakeRejection;

/// Penalty tiers used by the rules engine, in whole hryvnia.
pub const PENALTY_CRITICAL: u64 = 640_000;
pub const PENALTY_HIGH: u64 = 125_200;
pub const PENALTY_MEDIUM: u64 = 62_600;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Uk,
    En,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uk" | "ua" | "uk-ua" => Ok(Locale::Uk),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Which pipeline phase an error occurred in, when that changes the wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Upload,
    Analysis,
    Export,
}

pub fn intake_message(locale: Locale, rejection: IntakeRejection) -> &'static str {
    match (locale, rejection) {
        (Locale::Uk, IntakeRejection::TooLarge) => "Файл занадто великий. Максимальний розмір: 10 МБ",
        (Locale::Uk, IntakeRejection::UnsupportedFormat) => "Невірний формат. Підтримуються: JPG, PNG, PDF",
        (Locale::En, IntakeRejection::TooLarge) => "File is too large. Maximum size: 10 MB",
        (Locale::En, IntakeRejection::UnsupportedFormat) => "Unsupported format. Supported: JPG, PNG, PDF",
    }
}

/// Message for a failed check, keyed by error kind and stage.
///
/// Transport, server and not-found failures each read differently in every
/// stage. Anything without a dedicated message gets the generic analysis
/// failure.
pub fn error_message(locale: Locale, kind: ErrorKind, stage: FailureStage) -> &'static str {
    match (kind, stage) {
        (ErrorKind::Network, _) => service_unreachable(locale),
        (ErrorKind::NotFound, _) => session_expired(locale),
        (ErrorKind::ExportUnavailable, _) | (ErrorKind::Server, FailureStage::Export) => export_unavailable(locale),
        (ErrorKind::Server, FailureStage::Upload) => upload_rejected(locale),
        (ErrorKind::Server, FailureStage::Analysis) => service_failed(locale),
        (ErrorKind::Unexpected, _) => analysis_failed(locale),
    }
}

pub fn analysis_failed(locale: Locale) -> &'static str {
    match locale {
        Locale::Uk => "Помилка аналізу. Спробуйте ще раз",
        Locale::En => "Analysis failed. Please try again",
    }
}

fn service_unreachable(locale: Locale) -> &'static str {
    match locale {
        Locale::Uk => "Не вдалося з'єднатися із сервісом перевірки. Перевірте підключення та спробуйте ще раз",
        Locale::En => "Could not reach the check service. Check your connection and try again",
    }
}

fn upload_rejected(locale: Locale) -> &'static str {
    match locale {
        Locale::Uk => "Сервіс не зміг обробити файл. Спробуйте інше зображення етикетки",
        Locale::En => "The service could not process the file. Try another image of the label",
    }
}

fn service_failed(locale: Locale) -> &'static str {
    match locale {
        Locale::Uk => "Сервіс перевірки повернув помилку. Спробуйте пізніше",
        Locale::En => "The check service returned an error. Please try later",
    }
}

fn session_expired(locale: Locale) -> &'static str {
    match locale {
        Locale::Uk => "Сесія перевірки не знайдена або застаріла. Завантажте етикетку ще раз",
        Locale::En => "The check session was not found or has expired. Please upload the label again",
    }
}

fn export_unavailable(locale: Locale) -> &'static str {
    match locale {
        Locale::Uk => "Звіт наразі недоступний. Спробуйте пізніше",
        Locale::En => "The report is not available right now. Please try later",
    }
}

/// Whole-unit amount with space-grouped thousands: `62 600 грн`.
pub fn format_currency(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    format!("{grouped} грн")
}

pub fn share_summary(locale: Locale, is_valid: bool, error_count: usize) -> String {
    match (locale, is_valid) {
        (Locale::Uk, true) => "Перевірка етикетки завершена. Етикетка відповідає вимогам.".to_string(),
        (Locale::Uk, false) => format!("Перевірка етикетки завершена. Виявлено {error_count} помилок."),
        (Locale::En, true) => "Label check finished. The label meets the requirements.".to_string(),
        (Locale::En, false) => format!("Label check finished. {error_count} errors found."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0), "0 грн");
        assert_eq!(format_currency(999), "999 грн");
        assert_eq!(format_currency(62_600), "62 600 грн");
        assert_eq!(format_currency(PENALTY_CRITICAL), "640 000 грн");
        assert_eq!(format_currency(1_250_000), "1 250 000 грн");
    }

    #[test]
    fn test_kinds_have_distinct_messages_in_every_stage() {
        let kinds = [ErrorKind::Network, ErrorKind::Server, ErrorKind::NotFound];
        for locale in [Locale::Uk, Locale::En] {
            for stage in [FailureStage::Upload, FailureStage::Analysis, FailureStage::Export] {
                for (i, a) in kinds.iter().enumerate() {
                    for b in &kinds[i + 1..] {
                        assert_ne!(
                            error_message(locale, *a, stage),
                            error_message(locale, *b, stage),
                            "{a} and {b} share a message during {stage:?} ({locale:?})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_only_unexpected_gets_generic_message() {
        for stage in [FailureStage::Upload, FailureStage::Analysis] {
            for kind in [ErrorKind::Network, ErrorKind::Server, ErrorKind::NotFound] {
                assert_ne!(error_message(Locale::En, kind, stage), analysis_failed(Locale::En));
            }
        }
    }

    #[test]
    fn test_unexpected_falls_back_to_generic() {
        assert_eq!(
            error_message(Locale::En, ErrorKind::Unexpected, FailureStage::Analysis),
            analysis_failed(Locale::En)
        );
        assert_eq!(
            error_message(Locale::Uk, ErrorKind::Unexpected, FailureStage::Upload),
            analysis_failed(Locale::Uk)
        );
    }

    #[test]
    fn test_export_failures() {
        assert_eq!(
            error_message(Locale::En, ErrorKind::Server, FailureStage::Export),
            export_unavailable(Locale::En)
        );
        assert_eq!(
            error_message(Locale::En, ErrorKind::ExportUnavailable, FailureStage::Export),
            export_unavailable(Locale::En)
        );
        assert_eq!(
            error_message(Locale::En, ErrorKind::NotFound, FailureStage::Export),
            session_expired(Locale::En)
        );
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!("UK".parse::<Locale>(), Ok(Locale::Uk));
        assert_eq!("en".parse::<Locale>(), Ok(Locale::En));
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn test_share_summary() {
        assert_eq!(
            share_summary(Locale::En, false, 3),
            "Label check finished. 3 errors found."
        );
        assert!(share_summary(Locale::Uk, true, 0).contains("відповідає вимогам"));
    }
}
