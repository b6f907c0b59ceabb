//! Result aggregation: turns a raw validation response into a [`CheckReport`].
//!
//! Pure and total over any decodable response. Validity and penalties are
//! always recomputed from the findings; remote summary values are only
//! compared against and logged on mismatch.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::report::{CheckReport, Finding, PenaltyLine, Severity};
use crate::wire::{ValidationResponse, WireFinding};

pub fn aggregate(raw: ValidationResponse) -> CheckReport {
    let errors = into_findings(raw.errors, Severity::Error);
    let warnings = into_findings(raw.warnings, Severity::Warning);

    let total_penalty = total_penalty(errors.iter().chain(warnings.iter()));
    let penalty_breakdown = breakdown_by_source(errors.iter().chain(warnings.iter()));

    let mandatory_present = dedup(raw.mandatory_fields.present);
    let mandatory_missing = dedup(raw.mandatory_fields.missing);
    let forbidden_found = dedup(raw.forbidden_phrases.found);

    let is_valid = errors.is_empty() && mandatory_missing.is_empty();

    if let Some(remote) = raw.is_valid {
        if remote != is_valid {
            warn!(
                session_id = raw.session_id.as_deref().unwrap_or("-"),
                remote,
                computed = is_valid,
                "Remote validity disagrees with findings; using computed value"
            );
        }
    }
    if let Some(remote) = raw.penalties.total {
        if remote != total_penalty {
            warn!(
                session_id = raw.session_id.as_deref().unwrap_or("-"),
                remote,
                computed = total_penalty,
                "Remote penalty total disagrees with findings; using computed value"
            );
        }
    }

    CheckReport {
        is_valid,
        product_info: raw.product_info,
        errors,
        warnings,
        mandatory_present,
        mandatory_missing,
        forbidden_found,
        total_penalty,
        penalty_breakdown,
    }
}

/// Sum of every finding's penalty, regardless of severity.
pub fn total_penalty<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> u64 {
    findings
        .into_iter()
        .fold(0u64, |acc, f| acc.saturating_add(f.penalty))
}

/// Penalties grouped by citation, in order of first appearance.
pub fn breakdown_by_source<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Vec<PenaltyLine> {
    let mut lines: Vec<PenaltyLine> = Vec::new();
    for finding in findings {
        match lines.iter_mut().find(|l| l.source == finding.source) {
            Some(line) => line.amount = line.amount.saturating_add(finding.penalty),
            None => lines.push(PenaltyLine {
                source: finding.source.clone(),
                amount: finding.penalty,
            }),
        }
    }
    lines
}

fn into_findings(raw: Vec<WireFinding>, severity: Severity) -> Vec<Finding> {
    raw.into_iter()
        .map(|f| {
            if let Some(level) = f.level.as_deref() {
                if !level.eq_ignore_ascii_case(&severity.to_string()) {
                    debug!(field = %f.field, level, listed_as = %severity, "Finding level differs from its list");
                }
            }
            Finding {
                field: f.field,
                message: f.message,
                source: f.source,
                penalty: f.penalty,
                severity,
                recommendation: f.recommendation.filter(|r| !r.trim().is_empty()),
            }
        })
        .collect()
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{MandatoryFields, Penalties};

    fn wire(field: &str, source: &str, penalty: u64) -> WireFinding {
        WireFinding {
            field: field.to_string(),
            message: format!("{field} is not compliant"),
            source: source.to_string(),
            penalty,
            recommendation: None,
            level: None,
        }
    }

    #[test]
    fn test_empty_response_is_fully_compliant() {
        let report = aggregate(ValidationResponse::default());
        assert!(report.is_valid);
        assert_eq!(report.total_penalty, 0);
        assert!(report.penalty_breakdown.is_empty());
        assert!(report.errors.is_empty() && report.warnings.is_empty());
    }

    #[test]
    fn test_error_and_zero_penalty_warning() {
        let raw = ValidationResponse {
            errors: vec![wire("Ingredients", "Law 4122, art. 20", 62600)],
            warnings: vec![wire("Storage", "Order 1114, item 12", 0)],
            ..Default::default()
        };
        let report = aggregate(raw);
        assert!(!report.is_valid);
        assert_eq!(report.total_penalty, 62600);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.errors[0].severity, Severity::Error);
        assert_eq!(report.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_missing_mandatory_field_without_errors_is_invalid() {
        let raw = ValidationResponse {
            mandatory_fields: MandatoryFields {
                present: vec!["Name".into()],
                missing: vec!["Batch number".into()],
            },
            ..Default::default()
        };
        let report = aggregate(raw);
        assert!(report.errors.is_empty());
        assert!(!report.is_valid);
        assert_eq!(report.mandatory_missing, ["Batch number"]);
    }

    #[test]
    fn test_warnings_alone_keep_report_valid_but_count_toward_total() {
        let raw = ValidationResponse {
            warnings: vec![wire("Claims", "Law 4122, art. 36", 125200), wire("Font", "Order 1114", 0)],
            ..Default::default()
        };
        let report = aggregate(raw);
        assert!(report.is_valid);
        assert_eq!(report.total_penalty, 125200);
    }

    #[test]
    fn test_order_is_preserved() {
        let raw = ValidationResponse {
            errors: vec![wire("Zinc", "a", 1), wire("Biotin", "b", 2), wire("Iron", "c", 3)],
            ..Default::default()
        };
        let fields: Vec<_> = aggregate(raw).errors.into_iter().map(|f| f.field).collect();
        assert_eq!(fields, ["Zinc", "Biotin", "Iron"]);
    }

    #[test]
    fn test_total_independent_of_order() {
        let findings = vec![
            wire("A", "x", 640000),
            wire("B", "y", 125200),
            wire("C", "x", 62600),
            wire("D", "z", 0),
        ];
        let forward = aggregate(ValidationResponse {
            errors: findings[..2].to_vec(),
            warnings: findings[2..].to_vec(),
            ..Default::default()
        });
        let mut reversed_findings = findings.clone();
        reversed_findings.reverse();
        let reversed = aggregate(ValidationResponse {
            errors: reversed_findings[..2].to_vec(),
            warnings: reversed_findings[2..].to_vec(),
            ..Default::default()
        });
        assert_eq!(forward.total_penalty, 827800);
        assert_eq!(forward.total_penalty, reversed.total_penalty);
        let breakdown_sum: u64 = forward.penalty_breakdown.iter().map(|l| l.amount).sum();
        assert_eq!(breakdown_sum, forward.total_penalty);
    }

    #[test]
    fn test_breakdown_groups_by_source() {
        let raw = ValidationResponse {
            errors: vec![wire("A", "Law 4122", 62600), wire("B", "Order 1114", 125200)],
            warnings: vec![wire("C", "Law 4122", 62600)],
            ..Default::default()
        };
        let report = aggregate(raw);
        assert_eq!(
            report.penalty_breakdown,
            vec![
                PenaltyLine { source: "Law 4122".into(), amount: 125200 },
                PenaltyLine { source: "Order 1114".into(), amount: 125200 },
            ]
        );
    }

    #[test]
    fn test_remote_summary_is_recomputed() {
        let raw = ValidationResponse {
            is_valid: Some(true),
            errors: vec![wire("Ingredients", "Law 4122", 62600)],
            penalties: Penalties {
                total: Some(1),
                breakdown: Vec::new(),
            },
            ..Default::default()
        };
        let report = aggregate(raw);
        assert!(!report.is_valid);
        assert_eq!(report.total_penalty, 62600);
    }

    #[test]
    fn test_sets_are_deduplicated() {
        let mut raw = ValidationResponse::default();
        raw.forbidden_phrases.found = vec!["cures".into(), "miracle".into(), "cures".into()];
        raw.mandatory_fields.present = vec!["Name".into(), "Name".into()];
        let report = aggregate(raw);
        assert_eq!(report.forbidden_found, ["cures", "miracle"]);
        assert_eq!(report.mandatory_present, ["Name"]);
    }

    #[test]
    fn test_blank_recommendation_dropped() {
        let mut finding = wire("Storage", "Order 1114", 0);
        finding.recommendation = Some("  ".into());
        let report = aggregate(ValidationResponse {
            warnings: vec![finding],
            ..Default::default()
        });
        assert!(report.warnings[0].recommendation.is_none());
    }
}
