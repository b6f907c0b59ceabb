use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use labelcheck_core::messages::error_message;
use labelcheck_core::{
    AcceptedArtifact, CheckError, CheckEvent, CheckEventKind, CheckReport, CheckService, CheckState,
    FailureStage, Locale, Phase,
};

use crate::error::{ExportError, SubmitError};
use crate::session::{CheckSession, SessionError, SessionSnapshot};
use crate::ticker::{ProgressTicker, TickerSettings};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub ticker: TickerSettings,
    pub locale: Locale,
    /// Capacity of the event channel; slow subscribers skip older events.
    pub event_buffer: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ticker: TickerSettings::default(),
            locale: Locale::default(),
            event_buffer: 64,
        }
    }
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Complete(Arc<CheckReport>),
    Failed(SessionError),
    /// The session was reset or replaced before a remote call resolved; its
    /// result was discarded.
    Abandoned,
}

/// A downloadable report document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportExport {
    pub file_name: String,
    pub data: Bytes,
}

pub fn export_file_name(session_id: &str) -> String {
    format!("label-check-report-{session_id}.pdf")
}

/// Drives one check session at a time through extraction and validation.
///
/// State lives behind a lock shared with the progress ticker. Every change
/// is published on a broadcast channel while the lock is held, so
/// subscribers observe transitions in the order they were applied.
#[derive(Clone)]
pub struct CheckOrchestrator {
    service: Arc<dyn CheckService>,
    session: Arc<RwLock<CheckSession>>,
    events_tx: broadcast::Sender<CheckEvent>,
    config: OrchestratorConfig,
}

impl CheckOrchestrator {
    pub fn new(service: Arc<dyn CheckService>, config: OrchestratorConfig) -> Self {
        let (events_tx, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            service,
            session: Arc::new(RwLock::new(CheckSession::new())),
            events_tx,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CheckEvent> {
        self.events_tx.subscribe()
    }

    pub fn locale(&self) -> Locale {
        self.config.locale
    }

    fn emit(&self, event: CheckEvent) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }

    /// Run a full check for an accepted artifact.
    ///
    /// Allowed from `Idle` or a terminal state; a finished session is
    /// replaced. Resolves once the session reaches `Complete` or `Error`, or
    /// once it is abandoned by a concurrent reset.
    pub async fn submit(&self, artifact: AcceptedArtifact) -> Result<SubmitOutcome, SubmitError> {
        let epoch = {
            let mut session = self.session.write().await;
            let epoch = session.begin().map_err(|_| SubmitError::Busy {
                state: session.state(),
            })?;
            self.emit(CheckEvent::state(epoch, CheckState::Uploading));
            self.emit(CheckEvent::progress(epoch, Phase::Extraction, 0));
            epoch
        };

        let mut in_flight = InFlight {
            session: self.session.clone(),
            events: self.events_tx.clone(),
            epoch,
            armed: true,
        };
        let outcome = self.run(epoch, artifact).await;
        in_flight.armed = false;
        Ok(outcome)
    }

    async fn run(&self, epoch: u64, artifact: AcceptedArtifact) -> SubmitOutcome {
        info!(
            epoch,
            service = self.service.name(),
            file = artifact.name(),
            media_type = %artifact.media_type(),
            size = artifact.size(),
            "Starting label check"
        );

        let ticker = ProgressTicker::spawn(self.session.clone(), self.events_tx.clone(), epoch, self.config.ticker);
        let extracted = self.service.extract(&artifact).await;
        ticker.cancel();

        let extracted = match extracted {
            Ok(extracted) => extracted,
            Err(err) => return self.fail(epoch, err, FailureStage::Upload).await,
        };

        {
            let mut session = self.session.write().await;
            if let Err(refused) = session.extraction_succeeded(epoch, &extracted.session_id) {
                debug!(epoch, %refused, "Discarding extraction result");
                return SubmitOutcome::Abandoned;
            }
            self.emit(CheckEvent::progress(epoch, Phase::Extraction, 100));
            self.emit(CheckEvent::state(epoch, CheckState::Analyzing));
            self.emit(CheckEvent::progress(epoch, Phase::Validation, 0));
        }
        info!(epoch, session_id = %extracted.session_id, "Extraction complete");

        let report = match self.service.validate(&extracted.session_id).await {
            Ok(report) => Arc::new(report),
            Err(err) => return self.fail(epoch, err, FailureStage::Analysis).await,
        };

        {
            let mut session = self.session.write().await;
            if let Err(refused) = session.validation_succeeded(epoch, report.clone()) {
                debug!(epoch, %refused, "Discarding validation result");
                return SubmitOutcome::Abandoned;
            }
            self.emit(CheckEvent::progress(epoch, Phase::Validation, 100));
            self.emit(CheckEvent::state(epoch, CheckState::Complete));
        }
        info!(
            epoch,
            session_id = %extracted.session_id,
            is_valid = report.is_valid,
            errors = report.error_count(),
            warnings = report.warning_count(),
            total_penalty = report.total_penalty,
            "Label check complete"
        );

        SubmitOutcome::Complete(report)
    }

    async fn fail(&self, epoch: u64, err: CheckError, stage: FailureStage) -> SubmitOutcome {
        let kind = err.kind();
        let error = SessionError {
            kind,
            message: error_message(self.config.locale, kind, stage).to_string(),
        };

        let mut session = self.session.write().await;
        if let Err(refused) = session.failed(epoch, error.clone()) {
            debug!(epoch, %refused, error = %err, "Discarding failure of superseded session");
            return SubmitOutcome::Abandoned;
        }
        self.emit(CheckEvent::new(
            epoch,
            CheckEventKind::Failed {
                kind,
                message: error.message.clone(),
            },
        ));
        self.emit(CheckEvent::state(epoch, CheckState::Error));
        warn!(epoch, kind = %kind, error = %err, "Label check failed");

        SubmitOutcome::Failed(error)
    }

    /// Return to `Idle`, clearing everything the session held. Results of
    /// calls still in flight are ignored when they arrive.
    pub async fn reset(&self) {
        let mut session = self.session.write().await;
        let previous = session.state();
        let epoch = session.reset();
        self.emit(CheckEvent::state(epoch, CheckState::Idle));
        debug!(epoch, from = %previous, "Session reset");
    }

    /// Fetch the report document of the completed session. A failure here
    /// leaves the session untouched.
    pub async fn export_report(&self) -> Result<ReportExport, ExportError> {
        let session_id = {
            let session = self.session.read().await;
            match (session.state(), session.session_id()) {
                (CheckState::Complete, Some(id)) => id.to_string(),
                (state, _) => return Err(ExportError::NotReady { state }),
            }
        };

        match self.service.fetch_report_export(&session_id).await {
            Ok(data) => {
                info!(session_id = %session_id, bytes = data.len(), "Report exported");
                Ok(ReportExport {
                    file_name: export_file_name(&session_id),
                    data,
                })
            }
            Err(source) => {
                let kind = source.kind();
                warn!(session_id = %session_id, kind = %kind, error = %source, "Report export failed");
                Err(ExportError::Failed {
                    kind,
                    message: error_message(self.config.locale, kind, FailureStage::Export).to_string(),
                    source,
                })
            }
        }
    }

    pub async fn current_state(&self) -> CheckState {
        self.session.read().await.state()
    }

    pub async fn current_report(&self) -> Option<Arc<CheckReport>> {
        self.session.read().await.report()
    }

    pub async fn current_error(&self) -> Option<SessionError> {
        self.session.read().await.error().cloned()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.read().await.snapshot()
    }
}

/// Returns a session to `Idle` when its `submit` future is dropped before
/// the check resolved, so a torn-down presenter does not leave it busy.
struct InFlight {
    session: Arc<RwLock<CheckSession>>,
    events: broadcast::Sender<CheckEvent>,
    epoch: u64,
    armed: bool,
}

impl InFlight {
    fn release(session: &mut CheckSession, events: &broadcast::Sender<CheckEvent>, epoch: u64) {
        if let Some(next) = session.abandon(epoch) {
            let _ = events.send(CheckEvent::state(next, CheckState::Idle));
            debug!(epoch, "Dropped submission released its session");
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut session) = self.session.try_write() {
            Self::release(&mut session, &self.events, self.epoch);
            return;
        }
        // The lock is held elsewhere; finish the release once it frees up.
        let (session, events, epoch) = (self.session.clone(), self.events.clone(), self.epoch);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let mut session = session.write().await;
                Self::release(&mut session, &events, epoch);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use labelcheck_client::{Call, MockCheckService};
    use labelcheck_core::wire::{ValidationResponse, WireFinding};
    use labelcheck_core::{intake, Artifact, ErrorKind, IntakeRejection};
    use tokio::sync::Notify;

    fn jpeg(size: usize) -> Artifact {
        Artifact::new("label.jpg", "image/jpeg", vec![0u8; size])
    }

    fn accepted() -> AcceptedArtifact {
        intake::validate(jpeg(2 * 1024 * 1024)).unwrap()
    }

    fn finding(field: &str, penalty: u64) -> WireFinding {
        WireFinding {
            field: field.into(),
            message: format!("{field} issue"),
            source: "Law 2639-VIII".into(),
            penalty,
            recommendation: None,
            level: None,
        }
    }

    fn harness(mock: MockCheckService) -> (CheckOrchestrator, Arc<MockCheckService>) {
        let mock = Arc::new(mock);
        let orchestrator = CheckOrchestrator::new(mock.clone(), OrchestratorConfig::default());
        (orchestrator, mock)
    }

    fn drain(rx: &mut broadcast::Receiver<CheckEvent>) -> Vec<CheckEventKind> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event.kind);
        }
        events
    }

    fn progress_of(events: &[CheckEventKind], wanted: Phase) -> Vec<u8> {
        events
            .iter()
            .filter_map(|kind| match kind {
                CheckEventKind::Progress { phase, progress } if *phase == wanted => Some(*progress),
                _ => None,
            })
            .collect()
    }

    fn states(events: &[CheckEventKind]) -> Vec<CheckState> {
        events
            .iter()
            .filter_map(|kind| match kind {
                CheckEventKind::StateChanged { state } => Some(*state),
                _ => None,
            })
            .collect()
    }

    async fn wait_for_state(orchestrator: &CheckOrchestrator, state: CheckState) {
        for _ in 0..1000 {
            if orchestrator.current_state().await == state {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("never reached {state}");
    }

    #[tokio::test]
    async fn test_compliant_label_completes() {
        let (orchestrator, mock) = harness(MockCheckService::new());
        let mut rx = orchestrator.subscribe();

        let outcome = orchestrator.submit(accepted()).await.unwrap();
        let SubmitOutcome::Complete(report) = outcome.clone() else {
            panic!("expected completion, got {outcome:?}");
        };
        assert!(report.is_valid);
        assert_eq!(report.total_penalty, 0);

        assert_eq!(orchestrator.current_state().await, CheckState::Complete);
        assert_eq!(
            mock.calls().await,
            vec![
                Call::Extract { name: "label.jpg".into() },
                Call::Validate { session_id: "s1".into() },
            ]
        );
        assert_eq!(
            states(&drain(&mut rx)),
            vec![CheckState::Uploading, CheckState::Analyzing, CheckState::Complete]
        );
    }

    #[tokio::test]
    async fn test_findings_flow_into_report() {
        let response = ValidationResponse {
            errors: vec![finding("Ingredients", 62_600)],
            warnings: vec![finding("Storage", 0)],
            ..Default::default()
        };
        let (orchestrator, _) = harness(MockCheckService::new().with_validation(response));

        let SubmitOutcome::Complete(report) = orchestrator.submit(accepted()).await.unwrap() else {
            panic!("expected completion");
        };
        assert!(!report.is_valid);
        assert_eq!(report.total_penalty, 62_600);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(orchestrator.current_report().await, Some(report));
    }

    #[tokio::test]
    async fn test_oversized_artifact_never_reaches_service() {
        let (_orchestrator, mock) = harness(MockCheckService::new());
        let rejected = intake::validate(jpeg(12 * 1024 * 1024));
        assert_eq!(rejected.unwrap_err(), IntakeRejection::TooLarge);
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_extract_failure_skips_validation() {
        let mock = MockCheckService::new().with_extract(Err(CheckError::Network("connection failed".into())));
        let (orchestrator, mock) = harness(mock);

        let SubmitOutcome::Failed(error) = orchestrator.submit(accepted()).await.unwrap() else {
            panic!("expected failure");
        };
        assert_eq!(error.kind, ErrorKind::Network);
        assert!(!error.message.contains("connection failed"));
        assert_eq!(orchestrator.current_state().await, CheckState::Error);
        assert_eq!(orchestrator.current_error().await, Some(error));
        assert_eq!(mock.calls().await, vec![Call::Extract { name: "label.jpg".into() }]);
    }

    #[tokio::test]
    async fn test_expired_session_has_distinct_message() {
        let upload = MockCheckService::new().with_extract(Err(CheckError::Network("reset".into())));
        let (orchestrator, _) = harness(upload);
        let SubmitOutcome::Failed(upload_error) = orchestrator.submit(accepted()).await.unwrap() else {
            panic!("expected failure");
        };

        let expired = MockCheckService::new().with_validate(Err(CheckError::NotFound("s1".into())));
        let (orchestrator, _) = harness(expired);
        let SubmitOutcome::Failed(expired_error) = orchestrator.submit(accepted()).await.unwrap() else {
            panic!("expected failure");
        };

        assert_eq!(expired_error.kind, ErrorKind::NotFound);
        assert_ne!(expired_error.message, upload_error.message);
        assert_eq!(orchestrator.current_state().await, CheckState::Error);
    }

    #[tokio::test]
    async fn test_unexpected_error_uses_generic_message() {
        let mock = MockCheckService::new().with_validate(Err(CheckError::Unexpected("task panicked".into())));
        let (orchestrator, _) = harness(mock);
        let SubmitOutcome::Failed(error) = orchestrator.submit(accepted()).await.unwrap() else {
            panic!("expected failure");
        };
        assert_eq!(error.message, labelcheck_core::messages::analysis_failed(Locale::Uk));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_progress_sequence() {
        let mock = MockCheckService::new().with_extract_delay(Duration::from_secs(3));
        let (orchestrator, _) = harness(mock);
        let mut rx = orchestrator.subscribe();

        orchestrator.submit(accepted()).await.unwrap();
        let events = drain(&mut rx);

        assert_eq!(
            progress_of(&events, Phase::Extraction),
            vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
        assert_eq!(progress_of(&events, Phase::Validation), vec![0, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_completion() {
        let mock = MockCheckService::new().with_extract_delay(Duration::from_millis(500));
        let (orchestrator, _) = harness(mock);
        let mut rx = orchestrator.subscribe();

        orchestrator.submit(accepted()).await.unwrap();
        let before = drain(&mut rx);
        assert_eq!(progress_of(&before, Phase::Extraction), vec![0, 10, 20, 100]);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(orchestrator.snapshot().await.extraction_progress, 100);
    }

    #[tokio::test]
    async fn test_reset_clears_session() {
        let (orchestrator, _) = harness(MockCheckService::new());
        orchestrator.submit(accepted()).await.unwrap();
        assert!(orchestrator.snapshot().await.report.is_some());

        orchestrator.reset().await;
        let snapshot = orchestrator.snapshot().await;
        assert_eq!(snapshot.state, CheckState::Idle);
        assert_eq!(snapshot.session_id, None);
        assert_eq!(snapshot.report, None);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.extraction_progress, 0);
        assert_eq!(snapshot.validation_progress, 0);
    }

    #[tokio::test]
    async fn test_reset_during_extraction_discards_result() {
        let gate = Arc::new(Notify::new());
        let (orchestrator, mock) = harness(MockCheckService::new().with_extract_gate(gate.clone()));

        let running = orchestrator.clone();
        let task = tokio::spawn(async move { running.submit(accepted()).await });
        wait_for_state(&orchestrator, CheckState::Uploading).await;

        orchestrator.reset().await;
        gate.notify_one();

        assert_eq!(task.await.unwrap().unwrap(), SubmitOutcome::Abandoned);
        assert_eq!(orchestrator.current_state().await, CheckState::Idle);
        assert_eq!(orchestrator.snapshot().await.session_id, None);
        assert_eq!(mock.calls().await, vec![Call::Extract { name: "label.jpg".into() }]);
    }

    #[tokio::test]
    async fn test_reset_during_validation_discards_result() {
        let gate = Arc::new(Notify::new());
        let (orchestrator, _) = harness(MockCheckService::new().with_validate_gate(gate.clone()));

        let running = orchestrator.clone();
        let task = tokio::spawn(async move { running.submit(accepted()).await });
        wait_for_state(&orchestrator, CheckState::Analyzing).await;

        orchestrator.reset().await;
        gate.notify_one();

        assert_eq!(task.await.unwrap().unwrap(), SubmitOutcome::Abandoned);
        assert_eq!(orchestrator.current_state().await, CheckState::Idle);
        assert_eq!(orchestrator.current_report().await, None);
    }

    #[tokio::test]
    async fn test_second_submit_while_busy_is_refused() {
        let gate = Arc::new(Notify::new());
        let (orchestrator, mock) = harness(MockCheckService::new().with_extract_gate(gate.clone()));

        let running = orchestrator.clone();
        let task = tokio::spawn(async move { running.submit(accepted()).await });
        wait_for_state(&orchestrator, CheckState::Uploading).await;

        assert_eq!(
            orchestrator.submit(accepted()).await,
            Err(SubmitError::Busy {
                state: CheckState::Uploading
            })
        );

        gate.notify_one();
        assert!(matches!(task.await.unwrap(), Ok(SubmitOutcome::Complete(_))));
        assert_eq!(mock.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_resubmit_after_completion_starts_fresh() {
        let (orchestrator, _) = harness(MockCheckService::new());
        orchestrator.submit(accepted()).await.unwrap();
        let first = orchestrator.snapshot().await.epoch;

        orchestrator.submit(accepted()).await.unwrap();
        let snapshot = orchestrator.snapshot().await;
        assert!(snapshot.epoch > first);
        assert_eq!(snapshot.state, CheckState::Complete);
    }

    #[tokio::test]
    async fn test_export_after_completion() {
        let (orchestrator, mock) = harness(MockCheckService::new().with_session_id("abc"));
        orchestrator.submit(accepted()).await.unwrap();

        let export = orchestrator.export_report().await.unwrap();
        assert_eq!(export.file_name, "label-check-report-abc.pdf");
        assert!(export.data.starts_with(b"%PDF"));
        assert_eq!(
            mock.calls().await.last(),
            Some(&Call::FetchReportExport { session_id: "abc".into() })
        );
    }

    #[tokio::test]
    async fn test_export_requires_completed_session() {
        let (orchestrator, mock) = harness(MockCheckService::new());
        assert_eq!(
            orchestrator.export_report().await,
            Err(ExportError::NotReady { state: CheckState::Idle })
        );
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_export_failure_keeps_session_complete() {
        let mock = MockCheckService::new().with_export(Err(CheckError::ExportUnavailable("503".into())));
        let (orchestrator, _) = harness(mock);
        orchestrator.submit(accepted()).await.unwrap();

        let Err(ExportError::Failed { kind, message, .. }) = orchestrator.export_report().await else {
            panic!("expected export failure");
        };
        assert_eq!(kind, ErrorKind::ExportUnavailable);
        assert!(!message.contains("503"));
        assert_eq!(orchestrator.current_state().await, CheckState::Complete);
        assert!(orchestrator.current_report().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submission_stops_ticker_and_frees_session() {
        let mock = MockCheckService::new().with_extract_delay(Duration::from_secs(60));
        let (orchestrator, _) = harness(mock);
        let mut rx = orchestrator.subscribe();

        let running = orchestrator.clone();
        let task = tokio::spawn(async move { running.submit(accepted()).await });
        tokio::time::sleep(Duration::from_millis(450)).await;
        task.abort();
        let _ = task.await;

        assert_eq!(orchestrator.current_state().await, CheckState::Idle);
        let torn_down = drain(&mut rx);
        assert_eq!(progress_of(&torn_down, Phase::Extraction), vec![0, 10, 20]);
        assert_eq!(states(&torn_down), vec![CheckState::Uploading, CheckState::Idle]);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(orchestrator.snapshot().await.extraction_progress, 0);

        let outcome = orchestrator.submit(accepted()).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Complete(_)));
    }

    #[tokio::test]
    async fn test_dropped_submission_released_while_lock_is_held() {
        let gate = Arc::new(Notify::new());
        let (orchestrator, _) = harness(MockCheckService::new().with_extract_gate(gate));

        let running = orchestrator.clone();
        let task = tokio::spawn(async move { running.submit(accepted()).await });
        wait_for_state(&orchestrator, CheckState::Uploading).await;

        {
            let _held = orchestrator.session.read().await;
            task.abort();
            let _ = task.await;
        }
        wait_for_state(&orchestrator, CheckState::Idle).await;
        assert_eq!(orchestrator.snapshot().await.session_id, None);
    }
}
