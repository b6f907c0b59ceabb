use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CheckError;
use crate::intake::AcceptedArtifact;
use crate::report::{CheckReport, ExtractResult};

/// The remote check service as seen by the orchestrator.
///
/// Implementations perform network I/O only, keep no state between calls,
/// and never retry internally.
#[async_trait]
pub trait CheckService: Send + Sync {
    /// Implementation name for logs (e.g. "http", "mock").
    fn name(&self) -> &str;

    /// Phase 1: upload the artifact and extract its text.
    async fn extract(&self, artifact: &AcceptedArtifact) -> Result<ExtractResult, CheckError>;

    /// Phase 2: validate a previously extracted session.
    async fn validate(&self, session_id: &str) -> Result<CheckReport, CheckError>;

    /// Retrieve the rendered report document for a completed session.
    async fn fetch_report_export(&self, session_id: &str) -> Result<Bytes, CheckError>;
}
