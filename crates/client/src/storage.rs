//! Persisted credential storage.
//!
//! A [`TokenStore`] holds at most one bearer token per [`TokenSlot`]. Writes
//! are atomic per key; readers never observe a half-written token.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use am_botanics_core::TokenSlot;
use parking_lot::{Mutex, RwLock};
use secrecy::SecretString;
use thiserror::Error;

/// Errors raised while persisting tokens.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("token storage I/O error at {path}: {source}")]
    Io {
        /// Backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The backing file exists but is not valid JSON.
    #[error("token storage at {path} is corrupt: {source}")]
    Corrupt {
        /// Backing file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
}

/// Client-local persistent storage for bearer tokens.
///
/// Presence of a token says nothing about its validity; the session store
/// confirms it through rehydration.
pub trait TokenStore: Send + Sync {
    /// Read the token in `slot`.
    fn get(&self, slot: TokenSlot) -> Option<SecretString>;

    /// Store `token` in `slot`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&self, slot: TokenSlot, token: SecretString) -> Result<(), StorageError>;

    /// Remove the token in `slot`. Removing an empty slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn remove(&self, slot: TokenSlot) -> Result<(), StorageError>;

    /// Remove both slots.
    ///
    /// # Errors
    ///
    /// Returns the first write error; the remaining slot is still attempted.
    fn clear(&self) -> Result<(), StorageError> {
        let mut first_err = None;
        for slot in TokenSlot::PRIORITY {
            if let Err(e) = self.remove(slot) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// First token in [`TokenSlot::PRIORITY`] order.
    fn first_available(&self) -> Option<(TokenSlot, SecretString)> {
        TokenSlot::PRIORITY
            .into_iter()
            .find_map(|slot| self.get(slot).map(|token| (slot, token)))
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local token store. Used by tests and embedders that manage
/// persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slots: RwLock<BTreeMap<&'static str, SecretString>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `token` already in `slot`.
    #[must_use]
    pub fn with_token(slot: TokenSlot, token: &str) -> Self {
        let store = Self::new();
        store.slots.write().insert(slot.key(), SecretString::from(token.to_owned()));
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, slot: TokenSlot) -> Option<SecretString> {
        self.slots.read().get(slot.key()).cloned()
    }

    fn set(&self, slot: TokenSlot, token: SecretString) -> Result<(), StorageError> {
        self.slots.write().insert(slot.key(), token);
        Ok(())
    }

    fn remove(&self, slot: TokenSlot) -> Result<(), StorageError> {
        self.slots.write().remove(slot.key());
        Ok(())
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// Token store backed by a small JSON file keyed by slot name:
///
/// ```json
/// { "adminToken": "eyJhbGciOi..." }
/// ```
///
/// Every read goes to disk so separate processes sharing the file see each
/// other's writes. Writes go through a temporary file and a rename.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Create a store at `path`. The file and its parent directory are
    /// created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();

        // A corrupt file is replaced rather than blocking logout forever.
        let mut slots = self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable token storage");
            BTreeMap::new()
        });
        apply(&mut slots);

        let io_err = |source: io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(&slots).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, slot: TokenSlot) -> Option<SecretString> {
        match self.load() {
            Ok(slots) => slots.get(slot.key()).cloned().map(SecretString::from),
            Err(e) => {
                tracing::warn!(error = %e, slot = %slot, "Token storage unreadable; treating slot as empty");
                None
            }
        }
    }

    fn set(&self, slot: TokenSlot, token: SecretString) -> Result<(), StorageError> {
        use secrecy::ExposeSecret;

        let token = token.expose_secret().to_owned();
        self.update(|slots| {
            slots.insert(slot.key().to_owned(), token);
        })
    }

    fn remove(&self, slot: TokenSlot) -> Result<(), StorageError> {
        self.update(|slots| {
            slots.remove(slot.key());
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn exposed(token: Option<SecretString>) -> Option<String> {
        token.map(|t| t.expose_secret().to_owned())
    }

    #[test]
    fn test_memory_first_available_prefers_admin() {
        let store = MemoryTokenStore::with_token(TokenSlot::Customer, "cust");
        let (slot, _) = store.first_available().unwrap();
        assert_eq!(slot, TokenSlot::Customer);

        store
            .set(TokenSlot::Admin, SecretString::from("adm".to_owned()))
            .unwrap();
        let (slot, token) = store.first_available().unwrap();
        assert_eq!(slot, TokenSlot::Admin);
        assert_eq!(token.expose_secret(), "adm");
    }

    #[test]
    fn test_memory_clear_empties_both_slots() {
        let store = MemoryTokenStore::with_token(TokenSlot::Admin, "adm");
        store
            .set(TokenSlot::Customer, SecretString::from("cust".to_owned()))
            .unwrap();
        store.clear().unwrap();
        assert!(store.first_available().is_none());
    }

    #[test]
    fn test_memory_debug_redacts_tokens() {
        let store = MemoryTokenStore::with_token(TokenSlot::Admin, "super-secret-token");
        assert!(!format!("{store:?}").contains("super-secret-token"));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        assert!(store.first_available().is_none());
        store.remove(TokenSlot::Admin).unwrap();
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tokens.json");

        FileTokenStore::new(&path)
            .set(TokenSlot::Admin, SecretString::from("adm".to_owned()))
            .unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(exposed(reopened.get(TokenSlot::Admin)).as_deref(), Some("adm"));
        assert_eq!(exposed(reopened.get(TokenSlot::Customer)), None);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"adminToken\""));
    }

    #[test]
    fn test_file_store_remove_keeps_other_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        store
            .set(TokenSlot::Admin, SecretString::from("adm".to_owned()))
            .unwrap();
        store
            .set(TokenSlot::Customer, SecretString::from("cust".to_owned()))
            .unwrap();

        store.remove(TokenSlot::Admin).unwrap();

        assert_eq!(exposed(store.get(TokenSlot::Admin)), None);
        assert_eq!(exposed(store.get(TokenSlot::Customer)).as_deref(), Some("cust"));
    }

    #[test]
    fn test_file_store_corrupt_file_reads_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(store.get(TokenSlot::Admin).is_none());

        store.clear().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }
}
