//! Sequences one submission end to end: preflight, optional transcription,
//! slide generation, image conversion, video rendering.

use std::fmt::{self, Display};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use bon::Builder;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::credentials::{CredentialError, CredentialProvider};
use crate::encode::{DEFAULT_ENCODE_CONCURRENCY, EncodeError, encode_all, encode_file};
use crate::invitation::{EventDetails, RunResult};
use crate::services::extract::{ExtractError, TextExtraction};
use crate::services::slides::{SlideError, SlideGeneration};
use crate::services::video::{VideoError, VideoGeneration, build_video_prompt};

/// Stages a run moves through, in order. `Failed` absorbs any stage error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    PreparingAssets,
    ExtractingText,
    GeneratingSlides,
    ConvertingImages,
    GeneratingVideo,
    Done,
    Failed,
}

impl Stage {
    /// User-facing progress copy for the stage.
    pub fn loading_message(self) -> &'static str {
        match self {
            Self::Idle => "Waiting to start...",
            Self::PreparingAssets => "Preparing your assets...",
            Self::ExtractingText => "Extracting text from message file...",
            Self::GeneratingSlides => "Generating presentation content...",
            Self::ConvertingImages => "Converting images for video generation...",
            Self::GeneratingVideo => {
                "Crafting invitation video from presentation... This may take a few minutes."
            }
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::PreparingAssets => "asset preparation",
            Self::ExtractingText => "text extraction",
            Self::GeneratingSlides => "slide generation",
            Self::ConvertingImages => "image conversion",
            Self::GeneratingVideo => "video generation",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Progress notifications published while a run executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    StageChanged(Stage),
}

/// Everything one submission carries. Immutable for the run's lifetime.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub details: EventDetails,
    pub message_file: Option<PathBuf>,
    pub visual_images: Vec<PathBuf>,
    pub skip_video: bool,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no API key is configured; run `kalesma auth` or set GEMINI_API_KEY")]
    MissingApiKey,
    #[error("at least one visual image is required")]
    NoVisualImages,
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Slides(#[from] SlideError),
    #[error(transparent)]
    Video(#[from] VideoError),
}

/// A failed run. Outputs produced before the failing stage are retained in
/// `partial` so the caller can still display them.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct RunFailure {
    pub stage: Stage,
    pub partial: RunResult,
    #[source]
    pub source: RunError,
}

/// Drives one submission through the stage machine. `run` takes `&mut self`,
/// so a second submission cannot start while one is in flight.
#[derive(Builder)]
pub struct Orchestrator {
    extractor: Arc<dyn TextExtraction>,
    slides: Arc<dyn SlideGeneration>,
    video: Arc<dyn VideoGeneration>,
    credentials: Arc<dyn CredentialProvider>,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
    #[builder(skip)]
    stage: Stage,
}

impl Orchestrator {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Execute one submission. Any stage failure aborts the run, discards
    /// in-flight work, and requires a fresh submission to retry.
    pub async fn run(&mut self, request: GenerationRequest) -> Result<RunResult, RunFailure> {
        let run_id = Uuid::new_v4();
        info!(
            event = "run_start",
            %run_id,
            category = %request.details.category,
            images = request.visual_images.len(),
            has_message_file = request.message_file.is_some(),
            "starting invitation generation run"
        );

        let mut result = RunResult::default();

        // Preflight: nothing reaches the network until both checks pass.
        let key = match self.credentials.api_key() {
            Ok(key) => key,
            Err(err) => return Err(self.fail(Stage::Idle, result, err.into())),
        };
        if key.is_none() {
            return Err(self.fail(Stage::Idle, result, RunError::MissingApiKey));
        }
        if request.visual_images.is_empty() {
            return Err(self.fail(Stage::Idle, result, RunError::NoVisualImages));
        }

        self.set_stage(Stage::PreparingAssets);

        let mut details = request.details.clone();
        if let Some(path) = &request.message_file {
            self.set_stage(Stage::ExtractingText);
            let encoded = match encode_file(path).await {
                Ok(encoded) => encoded,
                Err(err) => return Err(self.fail(Stage::ExtractingText, result, err.into())),
            };
            let extracted = match self.extractor.extract_text(&encoded).await {
                Ok(text) => text,
                Err(err) => return Err(self.fail(Stage::ExtractingText, result, err.into())),
            };
            if extracted.trim().is_empty() {
                warn!(
                    event = "extraction_empty",
                    %run_id,
                    "message file produced no text; keeping the typed message"
                );
            } else {
                details.message = extracted;
            }
        }

        self.set_stage(Stage::GeneratingSlides);
        let presentation = match self.slides.generate(&details).await {
            Ok(presentation) => presentation,
            Err(err) => return Err(self.fail(Stage::GeneratingSlides, result, err.into())),
        };
        debug_assert!(result.presentation.is_none());
        result.presentation = Some(presentation.clone());

        self.set_stage(Stage::ConvertingImages);
        let concurrency = NonZeroUsize::new(DEFAULT_ENCODE_CONCURRENCY)
            .expect("encode concurrency constant is non-zero");
        let encoded_images = match encode_all(&request.visual_images, concurrency).await {
            Ok(images) => images,
            Err(err) => return Err(self.fail(Stage::ConvertingImages, result, err.into())),
        };
        debug_assert_eq!(encoded_images.len(), request.visual_images.len());

        if !request.skip_video {
            self.set_stage(Stage::GeneratingVideo);
            let prompt = build_video_prompt(&details, &presentation);
            // The first uploaded image seeds the video.
            let seed = &encoded_images[0];
            match self.video.generate(&prompt, seed).await {
                Ok(url) => {
                    debug_assert!(result.video_url.is_none());
                    result.video_url = Some(url);
                }
                Err(err) => return Err(self.fail(Stage::GeneratingVideo, result, err.into())),
            }
        }

        self.set_stage(Stage::Done);
        info!(
            event = "run_complete",
            %run_id,
            slides = result.presentation.as_ref().map(|p| p.slide_count()).unwrap_or(0),
            has_video = result.video_url.is_some(),
            "invitation generation run completed"
        );
        Ok(result)
    }

    fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
        info!(event = "stage_changed", stage = %stage);
        if let Some(events) = &self.events {
            let _ = events.send(RunEvent::StageChanged(stage));
        }
    }

    fn fail(&mut self, stage: Stage, partial: RunResult, source: RunError) -> RunFailure {
        warn!(event = "run_failed", stage = %stage, error = %source);
        self.set_stage(Stage::Failed);
        RunFailure {
            stage,
            partial,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_copy_matches_the_form_flow() {
        assert_eq!(Stage::PreparingAssets.loading_message(), "Preparing your assets...");
        assert_eq!(
            Stage::ExtractingText.loading_message(),
            "Extracting text from message file..."
        );
        assert!(Stage::GeneratingVideo.loading_message().contains("a few minutes"));
    }

    #[test]
    fn default_stage_is_idle() {
        assert_eq!(Stage::default(), Stage::Idle);
        assert_eq!(Stage::default().to_string(), "idle");
    }
}
