//! Invitation video rendering: submit a long-running job, then poll it at a
//! fixed interval until completion, a deadline, or cancellation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::encode::EncodedFile;
use crate::gemini::types::{VideoGenerationRequest, VideoJob};
use crate::gemini::{GeminiClient, GeminiError};
use crate::invitation::{EventDetails, Presentation};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_VIDEO_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum VideoError {
    #[error(transparent)]
    Service(#[from] GeminiError),
    #[error("video job completed without a rendered video")]
    MissingVideo,
    #[error("video job did not complete within {waited_secs}s")]
    TimedOut { waited_secs: u64 },
    #[error("video generation cancelled")]
    Cancelled,
}

/// Current state of a rendering job as seen by one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoJobState {
    Pending,
    Done { uri: Option<String> },
}

/// Wire-level seam: submit a job, poll it, compose the retrievable URL.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    async fn submit(&self, prompt: &str, seed: &EncodedFile) -> Result<VideoJob, GeminiError>;
    async fn poll(&self, job: &VideoJob) -> Result<VideoJobState, GeminiError>;
    fn download_url(&self, uri: &str) -> String;
}

/// Whole-operation seam consumed by the orchestrator.
#[async_trait]
pub trait VideoGeneration: Send + Sync {
    async fn generate(&self, prompt: &str, seed: &EncodedFile) -> Result<String, VideoError>;
}

#[derive(Debug, Clone)]
pub struct GeminiVideoBackend {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiVideoBackend {
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl VideoBackend for GeminiVideoBackend {
    async fn submit(&self, prompt: &str, seed: &EncodedFile) -> Result<VideoJob, GeminiError> {
        let request = VideoGenerationRequest::single(prompt, seed);
        self.client.submit_video_job(&self.model, &request).await
    }

    async fn poll(&self, job: &VideoJob) -> Result<VideoJobState, GeminiError> {
        let operation = self.client.poll_video_job(job).await?;
        if let Some(status) = operation.error {
            return Err(GeminiError::Api {
                status: status.code.unwrap_or(0).clamp(0, i64::from(u16::MAX)) as u16,
                message: status
                    .message
                    .unwrap_or_else(|| "video generation failed".to_string()),
            });
        }
        if operation.done {
            Ok(VideoJobState::Done {
                uri: operation.first_video_uri().map(str::to_string),
            })
        } else {
            Ok(VideoJobState::Pending)
        }
    }

    fn download_url(&self, uri: &str) -> String {
        self.client.download_url(uri)
    }
}

/// Drives a [`VideoBackend`] to completion. Every wait yields to the runtime;
/// the loop is bounded by `timeout` and stops early when the cancel flag
/// flips to true.
#[derive(Builder)]
pub struct VideoGenerator {
    backend: Arc<dyn VideoBackend>,
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    poll_interval: Duration,
    #[builder(default = DEFAULT_VIDEO_TIMEOUT)]
    timeout: Duration,
    cancel: Option<watch::Receiver<bool>>,
}

#[async_trait]
impl VideoGeneration for VideoGenerator {
    async fn generate(&self, prompt: &str, seed: &EncodedFile) -> Result<String, VideoError> {
        let job = self.backend.submit(prompt, seed).await?;
        info!(event = "video_job_submitted", job = %job.name, "video generation job submitted");

        let deadline = Instant::now() + self.timeout;
        let mut cancel = self.cancel.clone();
        let mut polls: u32 = 0;

        loop {
            if let Some(rx) = &cancel
                && *rx.borrow()
            {
                return Err(VideoError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(VideoError::TimedOut {
                    waited_secs: self.timeout.as_secs(),
                });
            }

            let mut drop_cancel = false;
            match &mut cancel {
                Some(rx) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        changed = rx.changed() => match changed {
                            Ok(()) if *rx.borrow() => return Err(VideoError::Cancelled),
                            Ok(()) => continue,
                            Err(_) => drop_cancel = true,
                        },
                    }
                }
                None => tokio::time::sleep(self.poll_interval).await,
            }
            if drop_cancel {
                // Sender went away without signalling; keep polling without it.
                cancel = None;
                continue;
            }

            polls = polls.saturating_add(1);
            match self.backend.poll(&job).await? {
                VideoJobState::Pending => {
                    debug!(event = "video_job_pending", job = %job.name, polls);
                }
                VideoJobState::Done { uri: Some(uri) } => {
                    info!(event = "video_job_done", job = %job.name, polls, "video rendered");
                    return Ok(self.backend.download_url(&uri));
                }
                VideoJobState::Done { uri: None } => return Err(VideoError::MissingVideo),
            }
        }
    }
}

/// Video prompt seeded from the generated deck so the two outputs stay
/// consistent: the event fields set the tone, the slides become the scenes.
pub(crate) fn build_video_prompt(details: &EventDetails, presentation: &Presentation) -> String {
    let mut prompt = format!(
        "Create a short, elegant 15-second {category} invitation video for {recipient}, \
celebrating their {designation}.
The video should play as an animated slideshow with smooth transitions between scenes.
Use the provided image as the main visual inspiration for backgrounds and thematic elements.
The tone should be appropriate for a {category}: celebratory, warm, and professional. Use a \
mix of elegant fonts suitable for the event.

Animate one scene per slide below, in order, showing the slide title and its lines as styled \
text:
",
        category = details.category,
        recipient = details.recipient,
        designation = details.designation,
    );

    for (index, slide) in presentation.slides.iter().enumerate() {
        prompt.push_str(&format!("\n**Scene {}: {}**\n", index + 1, slide.title));
        for line in &slide.content {
            prompt.push_str(&format!("- {line}\n"));
        }
    }

    prompt
}
