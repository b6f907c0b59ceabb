//! Structured logging for LabelCheck.
//!
//! Handles log redaction, console and rotating JSON output, and check event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{CheckEventLogger, EventLogEntry};
pub use logger::{LogGuard, init_logger};
pub use redact::redact_sensitive_data;
