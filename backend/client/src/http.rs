use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use labelcheck_core::wire::{ErrorBody, ExtractResponse, ValidateRequest, ValidationResponse};
use labelcheck_core::{aggregate, AcceptedArtifact, CheckError, CheckReport, CheckService, ExtractResult};
use labelcheck_logging::redact_sensitive_data;

const CHECK_LABEL_PATH: [&str; 2] = ["api", "check-label"];

/// Transport settings for [`HttpCheckService`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Whole-request timeout; extraction runs OCR so this is generous.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            user_agent: concat!("labelcheck/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Check service reached over HTTP.
///
/// Endpoints, relative to the base address:
///   POST api/check-label/quick              multipart `file`
///   POST api/check-label/full               `{"check_id": ...}`
///   GET  api/check-label/{check_id}/report.pdf
pub struct HttpCheckService {
    client: Client,
    base_url: Url,
}

impl HttpCheckService {
    pub fn new(base_url: &str, options: HttpOptions) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("Invalid service base URL: {base_url}"))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            bail!("Service base URL must be http(s): {base_url}");
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url, CheckError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CheckError::Unexpected(format!("base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(CHECK_LABEL_PATH)
            .extend(tail);
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, CheckError> {
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(status = status.as_u16(), error = %e, "Malformed {what} response");
            CheckError::server(Some(status.as_u16()), format!("malformed {what} response: {e}"))
        })
    }
}

fn transport_error(e: reqwest::Error) -> CheckError {
    let cause = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    CheckError::Network(format!("{cause}: {e}"))
}

/// Read the error body of a non-2xx response into a log-friendly string.
/// Server text may echo credentials or addresses, so it is redacted here.
async fn failure_detail(response: Response) -> String {
    let status = response.status();
    let raw = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&raw)
        .ok()
        .and_then(|b| b.describe())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string()
        });
    redact_sensitive_data(&detail)
}

#[async_trait]
impl CheckService for HttpCheckService {
    fn name(&self) -> &str {
        "http"
    }

    async fn extract(&self, artifact: &AcceptedArtifact) -> Result<ExtractResult, CheckError> {
        let start = Instant::now();
        let url = self.endpoint(&["quick"])?;

        let part = Part::stream_with_length(artifact.data().clone(), artifact.size())
            .file_name(artifact.name().to_string())
            .mime_str(artifact.media_type().mime())
            .map_err(|e| CheckError::Unexpected(format!("invalid upload part: {e}")))?;
        let form = Form::new().part("file", part);

        debug!(url = %url, name = artifact.name(), size = artifact.size(), "Uploading artifact for extraction");

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = failure_detail(response).await;
            warn!(status = status.as_u16(), detail = %detail, "Extraction rejected");
            return Err(CheckError::server(Some(status.as_u16()), detail));
        }

        let body: ExtractResponse = Self::decode(response, "extraction").await?;
        info!(
            session_id = %body.session_id,
            latency_ms = start.elapsed().as_millis() as u64,
            "Extraction finished"
        );
        Ok(body.into())
    }

    async fn validate(&self, session_id: &str) -> Result<CheckReport, CheckError> {
        let start = Instant::now();
        let url = self.endpoint(&["full"])?;

        debug!(url = %url, session_id, "Requesting validation");

        let response = self
            .client
            .post(url)
            .json(&ValidateRequest {
                check_id: session_id.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let detail = failure_detail(response).await;
            warn!(session_id, detail = %detail, "Validation session not found");
            return Err(CheckError::NotFound(session_id.to_string()));
        }
        if !status.is_success() {
            let detail = failure_detail(response).await;
            warn!(session_id, status = status.as_u16(), detail = %detail, "Validation rejected");
            return Err(CheckError::server(Some(status.as_u16()), detail));
        }

        let body: ValidationResponse = Self::decode(response, "validation").await?;
        let report = aggregate(body);
        info!(
            session_id,
            is_valid = report.is_valid,
            errors = report.error_count(),
            warnings = report.warning_count(),
            total_penalty = report.total_penalty,
            latency_ms = start.elapsed().as_millis() as u64,
            "Validation finished"
        );
        Ok(report)
    }

    async fn fetch_report_export(&self, session_id: &str) -> Result<Bytes, CheckError> {
        let url = self.endpoint(&[session_id, "report.pdf"])?;

        debug!(url = %url, session_id, "Fetching report export");

        let response = self.client.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CheckError::NotFound(session_id.to_string()));
        }
        if !status.is_success() {
            let detail = failure_detail(response).await;
            warn!(session_id, status = status.as_u16(), detail = %detail, "Report export unavailable");
            return Err(CheckError::ExportUnavailable(detail));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        info!(session_id, bytes = body.len(), "Report export fetched");
        Ok(body)
    }
}
