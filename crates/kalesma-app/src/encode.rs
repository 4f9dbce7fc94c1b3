//! File-to-payload encoding for inline transport to the generative API.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use futures_concurrency::{concurrent_stream::IntoConcurrentStream, prelude::ConcurrentStream};
use thiserror::Error;

/// Largest file accepted for inline transport.
const MAX_INLINE_FILE_BYTES: usize = 20 * 1024 * 1024;

/// How many uploads are encoded at once when a run carries several images.
pub const DEFAULT_ENCODE_CONCURRENCY: usize = 4;

/// A file's contents as a transportable base64 string plus its media type.
/// Produced per uploaded file, consumed by one request, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub data: String,
    pub media_type: String,
}

/// Errors produced while turning local files into encoded payloads.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to read input file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file type: {path}")]
    UnsupportedType { path: PathBuf },
    #[error("file {path} is empty")]
    Empty { path: PathBuf },
    #[error("file {path} exceeds the inline transport limit of {limit} bytes")]
    TooLarge { path: PathBuf, limit: usize },
    #[error("invalid data URL: {reason}")]
    InvalidDataUrl { reason: String },
}

/// Media type derived from the file extension. The encoder trusts the
/// declared type; content sniffing is the service's concern.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Read a file and encode it for inline transport. No retries; read failures
/// surface immediately to the caller.
pub async fn encode_file(path: &Path) -> Result<EncodedFile, EncodeError> {
    let media_type = media_type_for_path(path).ok_or_else(|| EncodeError::UnsupportedType {
        path: path.to_path_buf(),
    })?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| EncodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    if bytes.is_empty() {
        return Err(EncodeError::Empty {
            path: path.to_path_buf(),
        });
    }
    if bytes.len() > MAX_INLINE_FILE_BYTES {
        return Err(EncodeError::TooLarge {
            path: path.to_path_buf(),
            limit: MAX_INLINE_FILE_BYTES,
        });
    }

    Ok(EncodedFile {
        data: BASE64_STANDARD.encode(&bytes),
        media_type: media_type.to_string(),
    })
}

/// Split a `data:<media type>;base64,<payload>` URL into an [`EncodedFile`],
/// keeping only the payload after the separator.
pub fn from_data_url(url: &str) -> Result<EncodedFile, EncodeError> {
    let (head, payload) = url.split_once(',').ok_or_else(|| EncodeError::InvalidDataUrl {
        reason: "missing `,` separator".to_string(),
    })?;
    let head = head
        .strip_prefix("data:")
        .ok_or_else(|| EncodeError::InvalidDataUrl {
            reason: "missing `data:` scheme".to_string(),
        })?;
    let media_type = head
        .strip_suffix(";base64")
        .ok_or_else(|| EncodeError::InvalidDataUrl {
            reason: "missing `;base64` marker".to_string(),
        })?;
    if media_type.is_empty() {
        return Err(EncodeError::InvalidDataUrl {
            reason: "empty media type".to_string(),
        });
    }
    if payload.is_empty() {
        return Err(EncodeError::InvalidDataUrl {
            reason: "empty payload".to_string(),
        });
    }

    Ok(EncodedFile {
        data: payload.to_string(),
        media_type: media_type.to_string(),
    })
}

/// Encode several files concurrently, preserving input order in the output.
/// There is no shared state beyond the result collector; the first failure
/// aborts the whole batch.
pub async fn encode_all(
    paths: &[PathBuf],
    concurrency: NonZeroUsize,
) -> Result<Vec<EncodedFile>, EncodeError> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }

    let collected = Arc::new(Mutex::new(Vec::with_capacity(paths.len())));

    paths
        .to_vec()
        .into_co_stream()
        .limit(Some(concurrency))
        .enumerate()
        .try_for_each({
            let collected = Arc::clone(&collected);
            move |(ordinal, path)| {
                let collected = Arc::clone(&collected);
                async move {
                    let encoded = encode_file(&path).await?;
                    let mut guard = collected.lock().expect("encode collection lock poisoned");
                    guard.push((ordinal, encoded));
                    Ok::<(), EncodeError>(())
                }
            }
        })
        .await?;

    let mut guard = collected.lock().expect("encode collection lock poisoned");
    let mut ordered = std::mem::take(&mut *guard);
    drop(guard);

    ordered.sort_by_key(|(ordinal, _)| *ordinal);
    Ok(ordered.into_iter().map(|(_, encoded)| encoded).collect())
}
