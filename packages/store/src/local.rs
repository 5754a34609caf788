//! # Browser `localStorage` store — web persistence
//!
//! [`LocalStore`] is the [`KeyValueStore`] used on the **web platform**. It
//! writes records straight into `window.localStorage`, which is synchronous,
//! scoped to the browser profile and survives page reloads.
//!
//! ## Connection management
//!
//! `LocalStore` holds no handle. `web_sys::Storage` is not `Send`, so each
//! operation looks the storage object up again through `web_sys::window()`;
//! the browser hands back the same object every time.
//!
//! ## Error handling
//!
//! Reads degrade to `None` (private browsing, storage disabled). Writes map the
//! thrown `JsValue` (typically a `QuotaExceededError`) to
//! [`StoreError::Backend`] so callers can keep their in-memory state unchanged.

use crate::kv::{KeyValueStore, StoreError};
use wasm_bindgen::JsValue;

/// `window.localStorage`-backed KeyValueStore for the web platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Result<web_sys::Storage, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Backend("no window".to_string()))?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StoreError::Backend("localStorage disabled".to_string()))
    }
}

fn js_error(value: JsValue) -> StoreError {
    StoreError::Backend(
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    )
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        let storage = Self::storage().ok()?;
        storage.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(js_error)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::storage()?
            .remove_item(key)
            .map_err(js_error)
    }
}
