/// Scoring client: the only module that talks to the remote scoring service.
///
/// The workflow depends on the `ScoringService` trait, never on
/// `HttpScoringClient` directly, so tests can swap in an in-memory service.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{MatchResult, ResumeFile};

/// Used when neither the server nor the transport produced a usable message.
pub const FALLBACK_ERROR_MESSAGE: &str = "Network Error";

const UPLOAD_PATH: &str = "/batch-upload";
const MATCH_PATH: &str = "/match";
const RESET_PATH: &str = "/reset-db";
const MODELS_PATH: &str = "/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status code {status}")]
    Api { status: u16, detail: Option<String> },

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ServiceError {
    /// Best human-readable message: server detail, then the transport-level
    /// message, then `FALLBACK_ERROR_MESSAGE`.
    pub fn user_message(&self) -> String {
        if let ServiceError::Api {
            detail: Some(detail),
            ..
        } = self
        {
            if !detail.trim().is_empty() {
                return detail.clone();
            }
        }

        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// The remote collaborator consumed by the upload-match workflow.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Sends every resume in one multipart batch.
    async fn batch_upload(&self, files: &[ResumeFile]) -> Result<(), ServiceError>;

    /// Scores the resumes held by the service against `job_description`.
    async fn match_candidates(&self, job_description: &str) -> Result<MatchResult, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<String>,
}

/// reqwest-backed `ScoringService` bound to one base URL.
#[derive(Clone)]
pub struct HttpScoringClient {
    client: Client,
    base_url: String,
}

impl HttpScoringClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Clears every resume the service has stored. Maintenance call, not part
    /// of a screening run.
    pub async fn reset_store(&self) -> Result<(), ServiceError> {
        let response = self.client.post(self.url(RESET_PATH)).send().await?;
        ensure_success(response).await?;
        info!("Scoring service store reset");
        Ok(())
    }

    /// Lists the scoring models the service reports as available.
    pub async fn list_models(&self) -> Result<Vec<String>, ServiceError> {
        let response = self.client.get(self.url(MODELS_PATH)).send().await?;
        let body = ensure_success(response).await?.text().await?;
        let parsed: ModelsResponse = serde_json::from_str(&body)?;
        Ok(parsed.models)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ScoringService for HttpScoringClient {
    async fn batch_upload(&self, files: &[ResumeFile]) -> Result<(), ServiceError> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.name.clone())
                .mime_str(file.mime_type())?;
            form = form.part("files", part);
        }

        debug!("Uploading {} resume(s) to {}", files.len(), self.base_url);

        let response = self
            .client
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(())
    }

    async fn match_candidates(&self, job_description: &str) -> Result<MatchResult, ServiceError> {
        let response = self
            .client
            .post(self.url(MATCH_PATH))
            .form(&[("job_description", job_description)])
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;

        let result: MatchResult = serde_json::from_str(&body)?;
        debug!(
            "Match returned {} candidate(s)",
            result.shortlisted_candidates.len()
        );

        Ok(result)
    }
}

/// Passes 2xx responses through; turns anything else into `ServiceError::Api`
/// carrying the body's `detail`, if there is one.
async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("Scoring service returned {}: {}", status, body);

    Err(ServiceError::Api {
        status: status.as_u16(),
        detail: extract_detail(&body),
    })
}

/// FastAPI-style error bodies put the message under `detail`, either as a
/// string or as structured validation errors.
fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
