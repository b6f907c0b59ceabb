//! Session-scoped state of the active check.
//!
//! Every mutation goes through a named transition. Transitions that resolve
//! a remote call carry the epoch they were started under and are refused
//! once the session has been reset or replaced.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use labelcheck_core::{CheckReport, CheckState, ErrorKind, Phase};

/// The user-facing failure recorded on a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
}

/// A transition that was not applied.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Refused {
    #[error("session epoch {expected} superseded by {current}")]
    Stale { expected: u64, current: u64 },
    #[error("cannot {action} while {from}")]
    Invalid { from: CheckState, action: &'static str },
}

/// Result of one simulated progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Advanced(u8),
    /// The ceiling is reached; further ticks change nothing.
    Saturated,
    /// The phase is over or the session was replaced.
    Finished,
}

#[derive(Debug, Default)]
pub struct CheckSession {
    epoch: u64,
    state: CheckState,
    session_id: Option<String>,
    extraction_progress: u8,
    validation_progress: u8,
    report: Option<Arc<CheckReport>>,
    error: Option<SessionError>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl CheckSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn progress(&self, phase: Phase) -> u8 {
        match phase {
            Phase::Extraction => self.extraction_progress,
            Phase::Validation => self.validation_progress,
        }
    }

    pub fn report(&self) -> Option<Arc<CheckReport>> {
        self.report.clone()
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    fn guard(&self, epoch: u64, expected: CheckState, action: &'static str) -> Result<(), Refused> {
        if epoch != self.epoch {
            return Err(Refused::Stale {
                expected: epoch,
                current: self.epoch,
            });
        }
        if self.state != expected {
            return Err(Refused::Invalid {
                from: self.state,
                action,
            });
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.session_id = None;
        self.extraction_progress = 0;
        self.validation_progress = 0;
        self.report = None;
        self.error = None;
        self.started_at = None;
        self.finished_at = None;
    }

    /// Start a new check. Allowed from idle and from terminal states; the
    /// previous outcome is discarded. Returns the new epoch.
    pub fn begin(&mut self) -> Result<u64, Refused> {
        if self.state.is_in_flight() {
            return Err(Refused::Invalid {
                from: self.state,
                action: "submit",
            });
        }
        self.clear();
        self.epoch += 1;
        self.state = CheckState::Uploading;
        self.started_at = Some(Utc::now());
        Ok(self.epoch)
    }

    /// Simulated extraction progress; never reaches 100 on its own.
    pub fn advance_simulated(&mut self, epoch: u64, step: u8, ceiling: u8) -> Tick {
        if self.guard(epoch, CheckState::Uploading, "tick").is_err() {
            return Tick::Finished;
        }
        if self.extraction_progress >= ceiling {
            return Tick::Saturated;
        }
        self.extraction_progress = self.extraction_progress.saturating_add(step).min(ceiling);
        Tick::Advanced(self.extraction_progress)
    }

    /// Phase 1 resolved: force its progress to 100 and move on to analysis.
    pub fn extraction_succeeded(&mut self, epoch: u64, session_id: &str) -> Result<(), Refused> {
        self.guard(epoch, CheckState::Uploading, "finish extraction")?;
        self.extraction_progress = 100;
        self.validation_progress = 0;
        self.session_id = Some(session_id.to_string());
        self.state = CheckState::Analyzing;
        Ok(())
    }

    pub fn validation_succeeded(&mut self, epoch: u64, report: Arc<CheckReport>) -> Result<(), Refused> {
        self.guard(epoch, CheckState::Analyzing, "finish validation")?;
        self.validation_progress = 100;
        self.report = Some(report);
        self.state = CheckState::Complete;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Move an in-flight session to the terminal error state.
    pub fn failed(&mut self, epoch: u64, error: SessionError) -> Result<(), Refused> {
        if epoch != self.epoch {
            return Err(Refused::Stale {
                expected: epoch,
                current: self.epoch,
            });
        }
        if !self.state.is_in_flight() {
            return Err(Refused::Invalid {
                from: self.state,
                action: "fail",
            });
        }
        self.error = Some(error);
        self.state = CheckState::Error;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Back to idle from any state. Bumps the epoch so anything still in
    /// flight for the old session is ignored when it resolves.
    pub fn reset(&mut self) -> u64 {
        self.clear();
        self.epoch += 1;
        self.state = CheckState::Idle;
        self.epoch
    }

    /// Release a session whose driver went away mid-flight. Only applies
    /// while `epoch` is still current and in flight; returns the new epoch.
    pub fn abandon(&mut self, epoch: u64) -> Option<u64> {
        (epoch == self.epoch && self.state.is_in_flight()).then(|| self.reset())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            epoch: self.epoch,
            state: self.state,
            session_id: self.session_id.clone(),
            extraction_progress: self.extraction_progress,
            validation_progress: self.validation_progress,
            error: self.error.clone(),
            report: self.report.as_deref().cloned(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Read-only view of a session for presenters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub epoch: u64,
    pub state: CheckState,
    pub session_id: Option<String>,
    pub extraction_progress: u8,
    pub validation_progress: u8,
    pub error: Option<SessionError>,
    pub report: Option<CheckReport>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}
