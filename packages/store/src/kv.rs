//! # Key-value persistence — the durable local store
//!
//! Everything the application keeps between runs goes through the
//! [`KeyValueStore`] trait: a synchronous, string-keyed, string-valued map with
//! the same shape as the browser's `localStorage`. The state crate writes two
//! records into it (`"user"` and `"notes"`, see [`crate::config::StorageConfig`]),
//! each one a JSON document that is replaced as a whole on every write.
//!
//! ## Implementations
//!
//! | Type | Backend | Used by |
//! |------|---------|---------|
//! | [`crate::MemoryStore`] | `HashMap` behind a shared mutex | tests, hosts without persistence |
//! | [`crate::FileStore`] | one JSON file per key, atomic rename on write | desktop / native |
//! | `LocalStore` | `window.localStorage` | web (`wasm32` + `web` feature) |
//!
//! ## Errors
//!
//! Reads never fail: a missing or unreadable record is `None`, and the caller
//! decides what an absent record means. Writes and removals report a
//! [`StoreError`] so the caller can keep its in-memory state untouched when a
//! record could not be persisted.

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`] write or removal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("storage backend unavailable: {0}")]
    Backend(String),
}

/// Synchronous string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    /// Read the record stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the record stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete the record stored under `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Check that a key is usable as a file name on every backend.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
