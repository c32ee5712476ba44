//! Local API-key storage.
//!
//! Keys live in a small JSON key-value file (`credentials.json` under the
//! user config directory). The Perplexity key is the record stored under
//! [`API_KEY_ENTRY`]. Nothing is encrypted and nothing expires.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY_ENTRY: &str = "perplexity-api-key";
const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key must not be empty")]
    EmptyKey,
    #[error("could not determine the user config directory")]
    NoConfigDir,
    #[error("credential store I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential store {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Stored shape of the API key entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    pub has_key: bool,
    pub key: Option<String>,
}

impl ApiKeyRecord {
    /// The key, when the record says one is present and it is non-blank.
    pub fn key(&self) -> Option<&str> {
        if !self.has_key {
            return None;
        }
        self.key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at `<config dir>/worldthink/credentials.json`.
    pub fn default_location() -> Result<Self, CredentialError> {
        let dir = dirs::config_dir().ok_or(CredentialError::NoConfigDir)?;
        Ok(Self::at(dir.join("worldthink").join(CREDENTIALS_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the API key record. A missing file or entry reads as "no key".
    pub fn load(&self) -> Result<ApiKeyRecord, CredentialError> {
        let entries = self.read_entries()?;
        match entries.get(API_KEY_ENTRY) {
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|source| {
                CredentialError::Parse {
                    path: self.path.clone(),
                    source,
                }
            }),
            None => Ok(ApiKeyRecord::default()),
        }
    }

    /// Trim and store `key`, replacing any previous one.
    pub fn save(&self, key: &str) -> Result<ApiKeyRecord, CredentialError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CredentialError::EmptyKey);
        }
        let record = ApiKeyRecord {
            has_key: true,
            key: Some(key.to_string()),
        };
        self.write_record(&record)?;
        tracing::info!(path = %self.path.display(), "credentials.saved");
        Ok(record)
    }

    /// Reset the entry to `{hasKey: false, key: null}`.
    pub fn clear(&self) -> Result<(), CredentialError> {
        self.write_record(&ApiKeyRecord::default())?;
        tracing::info!(path = %self.path.display(), "credentials.cleared");
        Ok(())
    }

    fn read_entries(&self) -> Result<Map<String, Value>, CredentialError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(CredentialError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| CredentialError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_record(&self, record: &ApiKeyRecord) -> Result<(), CredentialError> {
        let io_err = |source: std::io::Error| CredentialError::Io {
            path: self.path.clone(),
            source,
        };

        let mut entries = self.read_entries()?;
        let value = serde_json::to_value(record).map_err(|source| CredentialError::Parse {
            path: self.path.clone(),
            source,
        })?;
        entries.insert(API_KEY_ENTRY.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(&entries).map_err(|source| CredentialError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, body).map_err(io_err)
    }
}
