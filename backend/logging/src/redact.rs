//! Log Redaction
//!
//! Scrubs bearer tokens, API keys and e-mail addresses from text that came
//! from outside the process before it is logged.

use regex::Regex;
use std::sync::LazyLock;

static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bearer\s+[a-z0-9\-\._~+/]+=*").expect("valid regex"));
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)((?:api[_-]?key|token|secret)["']?\s*[:=]\s*["']?)[a-z0-9\-_]{8,}|\bsk-[a-z0-9]{20,}"#)
        .expect("valid regex")
});
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid regex"));

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "Bearer [REDACTED_TOKEN]");
    let redacted = API_KEY_RE.replace_all(&redacted, "${1}[REDACTED_TOKEN]");
    EMAIL_RE.replace_all(&redacted, "[REDACTED_EMAIL]").into_owned()
}
