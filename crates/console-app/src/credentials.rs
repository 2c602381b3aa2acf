//! Local credential store
//!
//! A small JSON map persisted to disk. A missing file or key means "not
//! configured" and is never an error.

use crate::error::StoreError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key under which the assistant credential is stored
pub const ASSISTANT_KEY: &str = "mk_assistant_api_key";

/// File-backed key/value credential store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store backed by the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read `key`; blank values count as absent
    ///
    /// # Errors
    /// - `StoreError::Io` if the file exists but cannot be read
    /// - `StoreError::Corrupt` if it is not a JSON string map
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.read_all()?;
        Ok(entries
            .get(key)
            .filter(|value| !value.trim().is_empty())
            .cloned())
    }

    /// Write `key`
    ///
    /// # Errors
    /// - `StoreError::Io` on write failure
    /// - `StoreError::Corrupt` if the existing file is unreadable
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)?;
        debug!(key, path = ?self.path, "credential stored");
        Ok(())
    }

    /// Delete `key`; returns whether it was present
    ///
    /// # Errors
    /// - `StoreError::Io` on write failure
    /// - `StoreError::Corrupt` if the existing file is unreadable
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.read_all()?;
        let removed = entries.remove(key).is_some();
        if removed {
            self.write_all(&entries)?;
            debug!(key, path = ?self.path, "credential removed");
        }
        Ok(removed)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        // BTreeMap<String, String> always serializes.
        let text = serde_json::to_string_pretty(entries).unwrap_or_default();
        std::fs::write(&self.path, text).map_err(io_err)
    }
}
