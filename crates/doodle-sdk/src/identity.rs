//! Persisted author identity.
//!
//! The display name chosen on the entry screen lives in a single key-value
//! slot that outlives the process. Views never touch the storage directly;
//! they receive an [`IdentityStore`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::SdkError;

/// Key under which the author name is stored.
pub const AUTHOR_KEY: &str = "chatAuthor";

const APP_DIR: &str = "doodle-chat";
const IDENTITY_FILE: &str = "identity.json";

/// Read/write access to the persisted display name.
pub trait IdentityStore: Send + Sync {
    /// The stored name, if any was saved.
    fn get(&self) -> Option<String>;

    /// Replace the stored name.
    fn set(&self, author: &str) -> Result<(), SdkError>;
}

impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    fn get(&self) -> Option<String> {
        (**self).get()
    }

    fn set(&self, author: &str) -> Result<(), SdkError> {
        (**self).set(author)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store, used by tests and when no config directory exists.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    value: Mutex<Option<String>>,
}

impl MemoryIdentityStore {
    /// A store pre-filled with `author`.
    pub fn with_author(author: &str) -> Self {
        Self {
            value: Mutex::new(Some(author.to_string())),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, author: &str) -> Result<(), SdkError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(author.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Key-value JSON file holding the author under [`AUTHOR_KEY`].
///
/// Other keys found in the file are preserved on write.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the user's config directory
    /// (`<config_dir>/doodle-chat/identity.json`).
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join(APP_DIR).join(IDENTITY_FILE)))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, SdkError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl IdentityStore for FileIdentityStore {
    fn get(&self) -> Option<String> {
        match self.read_map() {
            Ok(mut map) => map.remove(AUTHOR_KEY),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read identity file");
                None
            }
        }
    }

    fn set(&self, author: &str) -> Result<(), SdkError> {
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "identity file unreadable, rewriting it");
            BTreeMap::new()
        });
        map.insert(AUTHOR_KEY.to_string(), author.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&map)?)?;
        debug!(path = %self.path.display(), "identity saved");
        Ok(())
    }
}
