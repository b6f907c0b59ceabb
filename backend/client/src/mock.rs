use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Mutex, Notify};

use labelcheck_core::wire::ValidationResponse;
use labelcheck_core::{aggregate, AcceptedArtifact, CheckError, CheckReport, CheckService, ExtractResult};

/// A recorded call against [`MockCheckService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Extract { name: String },
    Validate { session_id: String },
    FetchReportExport { session_id: String },
}

/// A check service that returns canned results and records every call.
///
/// Each phase can be delayed or held behind a [`Notify`] gate so tests can
/// observe in-flight states.
pub struct MockCheckService {
    extract: Result<ExtractResult, CheckError>,
    validate: Result<CheckReport, CheckError>,
    export: Result<Bytes, CheckError>,
    extract_delay: Option<Duration>,
    validate_delay: Option<Duration>,
    extract_gate: Option<Arc<Notify>>,
    validate_gate: Option<Arc<Notify>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockCheckService {
    /// Extraction yields session `"s1"`, validation a fully compliant report.
    pub fn new() -> Self {
        Self {
            extract: Ok(ExtractResult {
                session_id: "s1".to_string(),
                product_info: Default::default(),
                extracted_text: String::new(),
            }),
            validate: Ok(aggregate(ValidationResponse::default())),
            export: Ok(Bytes::from_static(b"%PDF-1.4 mock report")),
            extract_delay: None,
            validate_delay: None,
            extract_gate: None,
            validate_gate: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        if let Ok(result) = &mut self.extract {
            result.session_id = session_id.into();
        }
        self
    }

    pub fn with_extract(mut self, result: Result<ExtractResult, CheckError>) -> Self {
        self.extract = result;
        self
    }

    /// Validation result built by aggregating a raw response.
    pub fn with_validation(mut self, response: ValidationResponse) -> Self {
        self.validate = Ok(aggregate(response));
        self
    }

    pub fn with_validate(mut self, result: Result<CheckReport, CheckError>) -> Self {
        self.validate = result;
        self
    }

    pub fn with_export(mut self, result: Result<Bytes, CheckError>) -> Self {
        self.export = result;
        self
    }

    pub fn with_extract_delay(mut self, delay: Duration) -> Self {
        self.extract_delay = Some(delay);
        self
    }

    pub fn with_validate_delay(mut self, delay: Duration) -> Self {
        self.validate_delay = Some(delay);
        self
    }

    pub fn with_extract_gate(mut self, gate: Arc<Notify>) -> Self {
        self.extract_gate = Some(gate);
        self
    }

    pub fn with_validate_gate(mut self, gate: Arc<Notify>) -> Self {
        self.validate_gate = Some(gate);
        self
    }

    /// Calls received so far, in order.
    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }
}

impl Default for MockCheckService {
    fn default() -> Self {
        Self::new()
    }
}

async fn hold(delay: Option<Duration>, gate: Option<&Arc<Notify>>) {
    if let Some(gate) = gate {
        gate.notified().await;
    }
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl CheckService for MockCheckService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(&self, artifact: &AcceptedArtifact) -> Result<ExtractResult, CheckError> {
        self.record(Call::Extract {
            name: artifact.name().to_string(),
        })
        .await;
        hold(self.extract_delay, self.extract_gate.as_ref()).await;
        self.extract.clone()
    }

    async fn validate(&self, session_id: &str) -> Result<CheckReport, CheckError> {
        self.record(Call::Validate {
            session_id: session_id.to_string(),
        })
        .await;
        hold(self.validate_delay, self.validate_gate.as_ref()).await;
        self.validate.clone()
    }

    async fn fetch_report_export(&self, session_id: &str) -> Result<Bytes, CheckError> {
        self.record(Call::FetchReportExport {
            session_id: session_id.to_string(),
        })
        .await;
        self.export.clone()
    }
}
