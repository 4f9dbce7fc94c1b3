//! Schema-constrained generation of the five-slide invitation deck.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;
use tracing::debug;

use crate::gemini::types::{GenerateContentRequest, GenerationConfig, Part};
use crate::gemini::{GeminiClient, GeminiError};
use crate::invitation::{EventDetails, Presentation};

#[derive(Debug, Error)]
pub enum SlideError {
    #[error(transparent)]
    Service(#[from] GeminiError),
    #[error("slide payload did not match the expected schema: {source}")]
    Schema {
        #[source]
        source: serde_json::Error,
    },
}

/// Produces a [`Presentation`] from the event fields. Malformed responses are
/// surfaced as schema errors, never coerced into a partial deck.
#[async_trait]
pub trait SlideGeneration: Send + Sync {
    async fn generate(&self, details: &EventDetails) -> Result<Presentation, SlideError>;
}

#[derive(Debug, Clone)]
pub struct GeminiSlideGenerator {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiSlideGenerator {
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl SlideGeneration for GeminiSlideGenerator {
    async fn generate(&self, details: &EventDetails) -> Result<Presentation, SlideError> {
        let request = GenerateContentRequest::new(vec![Part::text(build_slide_prompt(details))])
            .with_generation_config(GenerationConfig::json_schema(slide_response_schema()));

        let text = self.client.generate_content(&self.model, &request).await?;
        let presentation = parse_presentation(&text)?;
        debug!(
            event = "slides_generated",
            model = %self.model,
            slides = presentation.slide_count(),
            "slide deck generated"
        );
        Ok(presentation)
    }
}

pub(crate) fn parse_presentation(payload: &str) -> Result<Presentation, SlideError> {
    serde_json::from_str(payload).map_err(|source| SlideError::Schema { source })
}

/// Declared response shape: an object with a required `slides` array, each
/// slide requiring `title` and `content`.
fn slide_response_schema() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "slides": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "content": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["title", "content"]
                }
            }
        },
        "required": ["slides"]
    })
}

/// The instruction embeds every event field verbatim; the five-slide
/// structure is a declarative content contract enforced by the prompt.
pub(crate) fn build_slide_prompt(details: &EventDetails) -> String {
    format!(
        "You are an expert designer of invitation presentations. Based on the following details, \
generate a 5-slide presentation structure for a {category} invitation. The tone should be \
appropriate for the event: warm and respectful for a retirement, joyful for a birthday or \
wedding, and professional for a corporate event.

**Event Details:**
- **Category:** {category}
- **Event Name / Purpose:** {name}
- **Subject/Honoree:** {recipient}
- **Achievement / Reason:** {designation}
- **Invitation Message:** {message}
- **Date:** {date}
- **Time:** {time}
- **Venue:** {venue}
- **Hosted By:** {host}

**Slide Structure Guidelines (follow this closely):**
- **Slide 1: Title Slide:** Create a powerful and elegant title suitable for a {category}. It \
should include the main event title and the subject's name, \"{recipient}\".
- **Slide 2: The Invitation:** Formally invite the guests. State that they are invited to \
celebrate the occasion for the honoree and mention the reason for celebration.
- **Slide 3: A Note of Reflection/Celebration:** Include a heartfelt message appropriate for \
the event. Use the provided invitation message as inspiration.
- **Slide 4: Event Logistics:** Clearly list the details of the ceremony. It should have \
separate lines for \"Date\", \"Time\", and \"Venue\". Use the exact details provided.
- **Slide 5: Closing Slide:** A warm closing. Include a line like \"Looking forward to \
celebrating with you.\" and state who the invitation is from (\"Warm Regards, {host}\").

Generate the output in the specified JSON format.",
        category = details.category,
        name = details.name,
        recipient = details.recipient,
        designation = details.designation,
        message = details.message,
        date = details.date,
        time = details.time,
        venue = details.venue,
        host = details.host,
    )
}
