//! Persisted credential slot.
//!
//! Holds at most one bearer token. The token's presence is the only signal
//! that a session may be active; identity is always re-derived from it.
//! Every implementation serialises access behind a mutex so that reads,
//! writes and compare-and-delete are atomic with respect to each other.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// Fixed key of the credential slot (file name for the file-backed store).
pub const TOKEN_KEY: &str = "tpm_token";

/// Token storage errors.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Token storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Token storage lock poisoned")]
    Poisoned,
}

/// Storage backend for the single bearer token.
pub trait TokenStore: Send + Sync {
    /// Read the current token, if any.
    fn load(&self) -> Result<Option<String>, TokenStoreError>;

    /// Persist `token`, replacing any previous one.
    fn save(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Delete the token. Returns whether a token was present.
    fn clear(&self) -> Result<bool, TokenStoreError>;

    /// Delete the token only if it still equals `expected`.
    ///
    /// Returns `true` when this call removed it.
    fn clear_if(&self, expected: &str) -> Result<bool, TokenStoreError>;
}

/// Default location of the token file: `<data dir>/mini-tracker/tpm_token`.
pub fn default_token_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mini-tracker")
        .join(TOKEN_KEY)
}

// =============================================================================
// File-backed store
// =============================================================================

/// Token persisted as the sole contents of a file.
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn io_err(&self, source: io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_unlocked(&self) -> Result<Option<String>, TokenStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn remove_unlocked(&self) -> Result<bool, TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        let _guard = self.lock.lock().map_err(|_| TokenStoreError::Poisoned)?;
        self.read_unlocked()
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().map_err(|_| TokenStoreError::Poisoned)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        // Write-then-rename keeps the slot a single atomic replacement.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, token).map_err(|e| self.io_err(e))?;
        restrict_permissions(&tmp);
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        debug!(path = %self.path.display(), "token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<bool, TokenStoreError> {
        let _guard = self.lock.lock().map_err(|_| TokenStoreError::Poisoned)?;
        let removed = self.remove_unlocked()?;
        if removed {
            debug!(path = %self.path.display(), "token removed");
        }
        Ok(removed)
    }

    fn clear_if(&self, expected: &str) -> Result<bool, TokenStoreError> {
        let _guard = self.lock.lock().map_err(|_| TokenStoreError::Poisoned)?;
        match self.read_unlocked()? {
            Some(current) if current == expected => self.remove_unlocked(),
            _ => Ok(false),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path = %path.display(), "could not restrict token file permissions: {e}");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local token slot, used for embedding and tests.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        let slot = self.slot.lock().map_err(|_| TokenStoreError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut slot = self.slot.lock().map_err(|_| TokenStoreError::Poisoned)?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<bool, TokenStoreError> {
        let mut slot = self.slot.lock().map_err(|_| TokenStoreError::Poisoned)?;
        Ok(slot.take().is_some())
    }

    fn clear_if(&self, expected: &str) -> Result<bool, TokenStoreError> {
        let mut slot = self.slot.lock().map_err(|_| TokenStoreError::Poisoned)?;
        if slot.as_deref() == Some(expected) {
            *slot = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
