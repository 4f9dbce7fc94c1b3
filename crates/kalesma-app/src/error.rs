//! Application-level error type shared by the CLI entry points.

use inquire::InquireError;
use thiserror::Error;

use crate::config::AppConfigError;
use crate::credentials::CredentialError;
use crate::export::ExportError;
use crate::invitation::UnknownCategory;
use crate::services::orchestrator::{RunError, Stage};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    ConfigLoad(#[from] AppConfigError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    InvalidCategory(#[from] UnknownCategory),
    #[error(
        "no Gemini API key is configured; run `kalesma auth` or set GEMINI_API_KEY in the environment"
    )]
    MissingApiKey,
    #[error("{stage} failed: {source}")]
    Run {
        stage: Stage,
        #[source]
        source: RunError,
    },
    #[error("failed to read API key input: {source}")]
    Prompt {
        #[source]
        source: InquireError,
    },
}
