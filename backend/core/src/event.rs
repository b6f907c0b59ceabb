use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// The two remote phases of a check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Upload and text extraction.
    Extraction,
    /// Rule-based validation of the extracted data.
    Validation,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Extraction => write!(f, "extraction"),
            Phase::Validation => write!(f, "validation"),
        }
    }
}

/// Pipeline state of the active check session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Complete,
    Error,
}

impl CheckState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckState::Complete | CheckState::Error)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, CheckState::Uploading | CheckState::Analyzing)
    }

    /// The phase running in this state, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            CheckState::Uploading => Some(Phase::Extraction),
            CheckState::Analyzing => Some(Phase::Validation),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckState::Idle => "idle",
            CheckState::Uploading => "uploading",
            CheckState::Analyzing => "analyzing",
            CheckState::Complete => "complete",
            CheckState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Notification emitted by the orchestrator. Presenters subscribe; they
/// never poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckEvent {
    /// Monotonic counter identifying the session the event belongs to.
    pub epoch: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: CheckEventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckEventKind {
    StateChanged { state: CheckState },
    Progress { phase: Phase, progress: u8 },
    Failed { kind: ErrorKind, message: String },
}

impl CheckEvent {
    pub fn new(epoch: u64, kind: CheckEventKind) -> Self {
        Self {
            epoch,
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn state(epoch: u64, state: CheckState) -> Self {
        Self::new(epoch, CheckEventKind::StateChanged { state })
    }

    pub fn progress(epoch: u64, phase: Phase, progress: u8) -> Self {
        Self::new(epoch, CheckEventKind::Progress { phase, progress })
    }
}
