//! Domain types for an invitation generation run.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of event the invitation is for. Drives the tone of both the deck and
/// the video prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventCategory {
    #[default]
    Retirement,
    Birthday,
    Wedding,
    Corporate,
}

impl EventCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retirement => "Retirement",
            Self::Birthday => "Birthday",
            Self::Wedding => "Wedding",
            Self::Corporate => "Corporate",
        }
    }
}

impl Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown event category `{name}` (expected retirement, birthday, wedding, or corporate)")]
pub struct UnknownCategory {
    pub name: String,
}

impl FromStr for EventCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "retirement" => Ok(Self::Retirement),
            "birthday" => Ok(Self::Birthday),
            "wedding" => Ok(Self::Wedding),
            "corporate" => Ok(Self::Corporate),
            _ => Err(UnknownCategory {
                name: value.to_string(),
            }),
        }
    }
}

/// User-supplied event fields. Immutable once a run starts; the orchestrator
/// clones and resolves the message field before handing them to clients.
#[derive(Debug, Clone, Default)]
pub struct EventDetails {
    pub category: EventCategory,
    pub name: String,
    pub recipient: String,
    pub designation: String,
    pub message: String,
    pub date: String,
    pub time: String,
    pub venue: String,
    pub host: String,
}

/// One deck slide as returned by the structured slide generation call.
///
/// Both fields are required; a payload missing either fails deserialization
/// and is surfaced as a schema error rather than coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub content: Vec<String>,
}

/// The generated deck. Five slides by prompt convention; the count is not
/// enforced structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

/// Outputs accumulated over a single submission. The presentation, once set,
/// is never mutated; the video URL is set at most once per run.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub presentation: Option<Presentation>,
    pub video_url: Option<String>,
}
