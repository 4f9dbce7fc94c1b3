//! Thin REST client for the Generative Language API.
//!
//! Keeps transport concerns (URLs, auth, status handling) out of the service
//! layer; request and response shapes live in [`types`].

pub mod types;

use bon::Builder;
use reqwest::Client as HttpClient;
use thiserror::Error;
use tracing::debug;

use crate::gemini::types::{
    ApiErrorResponse, GenerateContentRequest, GenerateContentResponse, VideoGenerationRequest,
    VideoJob, VideoOperation,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Longest error-body excerpt echoed back into an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Errors surfaced by the wire client: transport failures, non-2xx API
/// responses, and undecodable payloads. Calls are single attempts; retry
/// policy, if any, belongs to the caller.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("request to the Gemini API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, Builder)]
pub struct GeminiClient {
    #[builder(default = HttpClient::new())]
    http: HttpClient,
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    base_url: String,
    #[builder(into)]
    api_key: String,
}

impl GeminiClient {
    /// One multimodal completion round trip. Returns the candidate text,
    /// empty when the service produced none; the caller owns the
    /// empty-output policy.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, GeminiError> {
        debug_assert!(!model.trim().is_empty());

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: GenerateContentResponse = response.json().await?;

        let text = body.text();
        debug!(
            event = "generate_content_done",
            model,
            chars = text.len(),
            "content generation call completed"
        );
        Ok(text)
    }

    /// Submit a video rendering request and return the operation handle.
    pub async fn submit_video_job(
        &self,
        model: &str,
        request: &VideoGenerationRequest,
    ) -> Result<VideoJob, GeminiError> {
        debug_assert!(!model.trim().is_empty());

        let url = format!("{}/models/{}:predictLongRunning", self.base_url, model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let job: VideoJob = response.json().await?;

        debug!(event = "video_job_submitted", model, job = %job.name);
        Ok(job)
    }

    /// Query the current state of a rendering operation.
    pub async fn poll_video_job(&self, job: &VideoJob) -> Result<VideoOperation, GeminiError> {
        debug_assert!(!job.name.trim().is_empty());

        let url = format!("{}/{}", self.base_url, job.name);
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Compose the retrievable URL for a result URI by appending the access
    /// credential the file endpoint requires.
    pub fn download_url(&self, uri: &str) -> String {
        format!("{uri}&key={}", self.api_key)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GeminiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|decoded| decoded.error.message)
            .unwrap_or_else(|_| truncate(&body));
        Err(GeminiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((offset, _)) => format!("{}…", &trimmed[..offset]),
        None => trimmed.to_string(),
    }
}
