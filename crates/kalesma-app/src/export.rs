//! Writes the generated deck to disk as pretty-printed JSON.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::invitation::Presentation;

/// Fixed output file name for the exported deck.
pub const PRESENTATION_FILE_NAME: &str = "invitation_presentation.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write the deck into `dir` and return the full path of the written file.
pub fn export_presentation(dir: &Path, presentation: &Presentation) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(PRESENTATION_FILE_NAME);
    let payload = serde_json::to_string_pretty(presentation)?;
    fs::write(&path, payload).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}
