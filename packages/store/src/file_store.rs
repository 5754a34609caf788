//! # Filesystem-backed key-value store
//!
//! [`FileStore`] is a [`KeyValueStore`] implementation that persists each record
//! as a JSON file on the local filesystem. It is used on native platforms to
//! retain the session and notes across restarts, the way `localStorage`
//! does in the browser.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── user.json      # current session user, absent when logged out
//! └── notes.json     # ordered note collection
//! ```
//!
//! ## Atomic overwrite
//!
//! A write goes to a temporary file in `<base_dir>` which is then renamed over
//! the target, so a reader sees either the previous record or the new one,
//! never a truncated file.
//!
//! ## Platform data directories
//!
//! [`FileStore::default_location`] uses [`dirs::data_dir()`]:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/chromacards/` |
//! | Linux | `~/.local/share/chromacards/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\chromacards\` |

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::kv::{validate_key, KeyValueStore, StoreError};

const APP_DIR: &str = "chromacards";

/// Filesystem-backed KeyValueStore for native persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    /// Store rooted at `<data_dir>/chromacards`, or `./chromacards` when the
    /// platform has no data directory.
    pub fn default_location() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self::new(base)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        validate_key(key).ok()?;
        std::fs::read_to_string(self.record_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        std::fs::create_dir_all(&self.base)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.base)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.record_path(key)).map_err(|e| e.error)?;

        tracing::debug!(key, bytes = value.len(), "record written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        match std::fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
