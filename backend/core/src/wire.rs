//! Remote contract shapes as sent by the check service.
//!
//! Required fields are enforced by serde: a body missing them fails to
//! decode, and the client reports that as a server error.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::report::{ExtractResult, PenaltyLine, ProductInfo};

/// Treat `null` the same as an absent field.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `62600` and `62600.0`, reject negative or fractional amounts.
fn whole_amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(de::Error::custom(format!(
            "penalty must be a non-negative whole amount, got {number}"
        ))),
    }
}

fn optional_whole_amount<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "whole_amount")] u64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

/// Body of a successful extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    #[serde(rename = "check_id", alias = "session_id")]
    pub session_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub product_info: ProductInfo,
    #[serde(default, alias = "full_text", deserialize_with = "nullable")]
    pub extracted_text: String,
}

impl From<ExtractResponse> for ExtractResult {
    fn from(r: ExtractResponse) -> Self {
        ExtractResult {
            session_id: r.session_id,
            product_info: r.product_info,
            extracted_text: r.extracted_text,
        }
    }
}

/// Body of the validation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub check_id: String,
}

/// A finding as the service reports it. Severity comes from the list it
/// appears in; `level` is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFinding {
    pub field: String,
    pub message: String,
    pub source: String,
    #[serde(deserialize_with = "whole_amount")]
    pub penalty: u64,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MandatoryFields {
    #[serde(default, deserialize_with = "nullable")]
    pub present: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForbiddenPhrases {
    #[serde(default, deserialize_with = "nullable")]
    pub found: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Penalties {
    #[serde(default, deserialize_with = "optional_whole_amount")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "nullable")]
    pub breakdown: Vec<PenaltyLine>,
}

/// Raw validation result, before aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResponse {
    #[serde(default, rename = "check_id", alias = "session_id")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub is_valid: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub product_info: ProductInfo,
    pub errors: Vec<WireFinding>,
    pub warnings: Vec<WireFinding>,
    #[serde(default, deserialize_with = "nullable")]
    pub mandatory_fields: MandatoryFields,
    #[serde(default, deserialize_with = "nullable")]
    pub forbidden_phrases: ForbiddenPhrases,
    #[serde(default, deserialize_with = "nullable")]
    pub penalties: Penalties,
}

/// Error body of a non-2xx response; either field may be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The most specific text available, for logs.
    pub fn describe(&self) -> Option<String> {
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return Some(message.to_string());
        }
        match &self.detail {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}
