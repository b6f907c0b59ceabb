use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::trace;

use labelcheck_core::{CheckEvent, Phase};

use crate::session::{CheckSession, Tick};

/// Cadence of the simulated extraction progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerSettings {
    pub interval: Duration,
    pub step: u8,
    /// Highest value the ticker may report; only a real result reaches 100.
    pub ceiling: u8,
}

impl Default for TickerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            step: 10,
            ceiling: 90,
        }
    }
}

/// Background task advancing phase-1 progress while `extract` is pending.
///
/// The task is aborted when the ticker is dropped, so every exit path of the
/// owning future (success, failure, cancellation) stops it.
pub(crate) struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    pub(crate) fn spawn(
        session: Arc<RwLock<CheckSession>>,
        events: broadcast::Sender<CheckEvent>,
        epoch: u64,
        settings: TickerSettings,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(settings.interval);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let mut guard = session.write().await;
                match guard.advance_simulated(epoch, settings.step, settings.ceiling) {
                    Tick::Advanced(progress) => {
                        let _ = events.send(CheckEvent::progress(epoch, Phase::Extraction, progress));
                    }
                    Tick::Saturated | Tick::Finished => {
                        trace!(epoch, "progress ticker stopped");
                        break;
                    }
                }
            }
        });

        Self { handle }
    }

    pub(crate) fn cancel(self) {
        drop(self);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
