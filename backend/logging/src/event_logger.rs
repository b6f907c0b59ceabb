//! Check Event Logger
//!
//! Follows the orchestrator's event stream and writes state changes and
//! progress milestones as structured `check_events` entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, trace, warn};

use labelcheck_core::{CheckEvent, CheckEventKind};

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub epoch: u64,
    pub timestamp: DateTime<Utc>,
    pub event: CheckEventKind,
}

pub struct CheckEventLogger {
    handle: JoinHandle<u64>,
}

impl CheckEventLogger {
    /// Start logging events from `events` until the sender side closes.
    pub fn spawn(mut events: broadcast::Receiver<CheckEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut logged = 0u64;
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if Self::log_event(event) {
                            logged += 1;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "check_events", skipped, "Event logger fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            logged
        });
        Self { handle }
    }

    /// Log a single event. Returns whether it was logged at `info`; ticks
    /// between milestones only go to `trace`.
    pub fn log_event(event: CheckEvent) -> bool {
        match Self::entry(event) {
            Some(entry) => {
                info!(target: "check_events", event = ?entry, "Check event");
                true
            }
            None => false,
        }
    }

    /// The structured entry for an event, or `None` for a non-milestone tick.
    /// Failure messages are fixed localized text and are kept verbatim.
    pub fn entry(event: CheckEvent) -> Option<EventLogEntry> {
        if let CheckEventKind::Progress { progress, .. } = event.kind {
            if !is_milestone(progress) {
                trace!(target: "check_events", epoch = event.epoch, progress, "Progress tick");
                return None;
            }
        }

        Some(EventLogEntry {
            epoch: event.epoch,
            timestamp: event.timestamp,
            event: event.kind,
        })
    }

    /// Wait for the stream to close; returns how many entries were logged.
    pub async fn join(self) -> u64 {
        self.handle.await.unwrap_or_default()
    }
}

fn is_milestone(progress: u8) -> bool {
    progress % 50 == 0
}
