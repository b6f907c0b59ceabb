use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a remote check operation.
///
/// The variants separate "could not reach the service" from "the service
/// answered and refused" from "the referenced session is unknown", because
/// each one is reported to the user differently.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckError {
    /// Transport-level failure: no response was received.
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived with a non-success status, or its body did not
    /// match the expected shape.
    #[error("server error ({}): {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "-".into()))]
    Server { status: Option<u16>, message: String },

    /// The remote side does not know the session identifier.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The rendered export could not be produced for the session.
    #[error("report export unavailable: {0}")]
    ExportUnavailable(String),

    /// Anything that is neither transport nor server attributed.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl CheckError {
    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::Network(_) => ErrorKind::Network,
            CheckError::Server { .. } => ErrorKind::Server,
            CheckError::NotFound(_) => ErrorKind::NotFound,
            CheckError::ExportUnavailable(_) => ErrorKind::ExportUnavailable,
            CheckError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

/// Stable, text-free classification of a [`CheckError`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Server,
    NotFound,
    ExportUnavailable,
    Unexpected,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ExportUnavailable => "export_unavailable",
            ErrorKind::Unexpected => "unexpected",
        };
        f.write_str(s)
    }
}
