use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::kv::{KeyValueStore, StoreError};

/// In-memory KeyValueStore for testing and hosts without persistence.
///
/// Clones share the same map, so a clone handed to a second store instance
/// behaves like reopening the same browser profile.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();

        // Initially empty
        assert!(store.get("user").is_none());
        assert!(store.is_empty());

        store.set("user", r#"{"id":"1"}"#).unwrap();
        assert_eq!(store.get("user").as_deref(), Some(r#"{"id":"1"}"#));

        // Overwrite replaces the whole record
        store.set("user", r#"{"id":"2"}"#).unwrap();
        assert_eq!(store.get("user").as_deref(), Some(r#"{"id":"2"}"#));
        assert_eq!(store.len(), 1);

        store.remove("user").unwrap();
        assert!(store.get("user").is_none());

        // Removing again is fine
        store.remove("user").unwrap();
    }

    #[test]
    fn test_clones_share_records() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("notes", "[]").unwrap();
        assert_eq!(other.get("notes").as_deref(), Some("[]"));
    }
}
