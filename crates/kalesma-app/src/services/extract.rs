//! Verbatim text transcription of an uploaded message file.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::encode::EncodedFile;
use crate::gemini::types::{GenerateContentRequest, Part};
use crate::gemini::{GeminiClient, GeminiError};

const EXTRACTION_PROMPT: &str = "Extract the complete text content from this image. If the image is a document, transcribe it verbatim.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Service(#[from] GeminiError),
}

/// Transcribes a document image into plain text. A single attempt per call;
/// the empty-output fallback policy belongs to the orchestrator, not here.
#[async_trait]
pub trait TextExtraction: Send + Sync {
    async fn extract_text(&self, file: &EncodedFile) -> Result<String, ExtractError>;
}

#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiExtractor {
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextExtraction for GeminiExtractor {
    async fn extract_text(&self, file: &EncodedFile) -> Result<String, ExtractError> {
        let request = GenerateContentRequest::new(vec![
            Part::text(EXTRACTION_PROMPT),
            Part::inline_data(file),
        ]);

        let text = self.client.generate_content(&self.model, &request).await?;
        debug!(
            event = "extraction_done",
            model = %self.model,
            chars = text.len(),
            "message file transcription completed"
        );
        Ok(text)
    }
}
