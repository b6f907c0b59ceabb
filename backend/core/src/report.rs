use std::fmt;

use serde::{Deserialize, Serialize};

use crate::messages::{self, Locale};

/// Finding severity. Errors block compliance; warnings are advisory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One observation from the validation phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub field: String,
    pub message: String,
    /// Citation of the rule the finding is based on.
    pub source: String,
    /// Whole currency units; zero means flagged without a fine.
    pub penalty: u64,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl Finding {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// A number or free text, as OCR output gives either.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Amount::Number(n) => write!(f, "{n}"),
            Amount::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
}

/// Best-effort structured product data recognised on the label.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub quantity: Option<Amount>,
    #[serde(default, deserialize_with = "crate::wire::nullable")]
    pub ingredients: Vec<Ingredient>,
}

/// Outcome of the extraction phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractResult {
    pub session_id: String,
    pub product_info: ProductInfo,
    pub extracted_text: String,
}

/// Total penalty attributed to one rule citation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PenaltyLine {
    pub source: String,
    pub amount: u64,
}

/// The aggregated outcome of a completed check.
///
/// Built once by [`crate::aggregate::aggregate`] and never edited afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckReport {
    pub is_valid: bool,
    pub product_info: ProductInfo,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub mandatory_present: Vec<String>,
    pub mandatory_missing: Vec<String>,
    pub forbidden_found: Vec<String>,
    pub total_penalty: u64,
    pub penalty_breakdown: Vec<PenaltyLine>,
}

impl CheckReport {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Errors first, then warnings, each in the order the service returned them.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// Short text for the share action.
    pub fn share_summary(&self, locale: Locale) -> String {
        messages::share_summary(locale, self.is_valid, self.error_count())
    }
}
