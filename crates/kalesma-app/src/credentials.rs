//! Pluggable API-key resolution: environment first, then a locally persisted
//! key saved through `kalesma auth`. A missing key disables submission
//! entirely; nothing in this module prompts or retries.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config;

const STORED_KEY_FILE: &str = "gemini_api_key";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("unable to resolve project directories")]
    MissingProjectDirs,
    #[error("failed to access credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("API key must not be empty")]
    EmptyKey,
}

/// Capability to produce the API credential, if one is configured.
pub trait CredentialProvider: Send + Sync {
    fn api_key(&self) -> Result<Option<String>, CredentialError>;
}

/// Reads `GOOGLE_AI_API_KEY`, falling back to `GEMINI_API_KEY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn api_key(&self) -> Result<Option<String>, CredentialError> {
        let key = std::env::var("GOOGLE_AI_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok();
        Ok(key.filter(|value| !value.trim().is_empty()))
    }
}

/// Key persisted on disk with an explicit manual save step.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    path: PathBuf,
}

impl StoredCredentials {
    /// Store rooted in the application config directory.
    pub fn from_project_dirs() -> Result<Self, CredentialError> {
        let dirs = config::project_dirs().map_err(|_| CredentialError::MissingProjectDirs)?;
        Ok(Self::at(dirs.config_dir().join(STORED_KEY_FILE)))
    }

    /// Store backed by an explicit file path; used by tests.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the key. Overwrites any previously saved value.
    pub fn save(&self, key: &str) -> Result<(), CredentialError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CredentialError::EmptyKey);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| CredentialError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, key).map_err(|source| CredentialError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl CredentialProvider for StoredCredentials {
    fn api_key(&self) -> Result<Option<String>, CredentialError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let key = contents.trim();
                Ok((!key.is_empty()).then(|| key.to_string()))
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CredentialError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// A fixed credential, resolved ahead of time. Useful once the CLI has
/// already picked a key, and as a test double.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    key: Option<String>,
}

impl StaticCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    pub fn missing() -> Self {
        Self { key: None }
    }
}

impl CredentialProvider for StaticCredentials {
    fn api_key(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.key.clone())
    }
}

/// Providers consulted in order; the first configured key wins.
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialChain {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Environment first, persisted key second.
    pub fn default_chain() -> Result<Self, CredentialError> {
        Ok(Self::new(vec![
            Box::new(EnvCredentials),
            Box::new(StoredCredentials::from_project_dirs()?),
        ]))
    }
}

impl CredentialProvider for CredentialChain {
    fn api_key(&self) -> Result<Option<String>, CredentialError> {
        for provider in &self.providers {
            if let Some(key) = provider.api_key()? {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stored_credentials_round_trip() {
        let temp = TempDir::new().expect("temp dir");
        let store = StoredCredentials::at(temp.path().join("nested").join(STORED_KEY_FILE));

        assert!(store.api_key().expect("read missing").is_none());
        store.save("  abc123  ").expect("save key");
        assert_eq!(store.api_key().expect("read saved"), Some("abc123".to_string()));
    }

    #[test]
    fn empty_key_is_rejected_on_save() {
        let temp = TempDir::new().expect("temp dir");
        let store = StoredCredentials::at(temp.path().join(STORED_KEY_FILE));
        assert!(matches!(store.save("   "), Err(CredentialError::EmptyKey)));
    }

    #[test]
    fn chain_returns_first_configured_key() {
        let chain = CredentialChain::new(vec![
            Box::new(StaticCredentials::missing()),
            Box::new(StaticCredentials::new("from-second")),
            Box::new(StaticCredentials::new("ignored")),
        ]);
        assert_eq!(
            chain.api_key().expect("resolve"),
            Some("from-second".to_string())
        );

        let empty = CredentialChain::new(vec![Box::new(StaticCredentials::missing())]);
        assert!(empty.api_key().expect("resolve").is_none());
    }
}
