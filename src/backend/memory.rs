//! In-process keyring, for tests and for embedding without an OS store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{BackendError, Keyring};

#[derive(Debug, Clone)]
struct StoredItem {
    label: String,
    data: Vec<u8>,
}

/// Keyring kept in memory.
///
/// Clones share the same items, so a test can keep a handle while the helper
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyring {
    items: Arc<Mutex<HashMap<String, StoredItem>>>,
}

impl MemoryKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under `key` with an empty label, bypassing any encoding.
    pub fn insert_raw(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        let mut items = self.items.lock().expect("memory keyring lock poisoned");
        items.insert(
            key.into(),
            StoredItem {
                label: String::new(),
                data: data.into(),
            },
        );
    }

    /// Raw bytes stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        let items = self.items.lock().expect("memory keyring lock poisoned");
        items.get(key).map(|item| item.data.clone())
    }

    /// Label stored with `key`.
    pub fn label(&self, key: &str) -> Option<String> {
        let items = self.items.lock().expect("memory keyring lock poisoned");
        items.get(key).map(|item| item.label.clone())
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("memory keyring lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Keyring for MemoryKeyring {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn set(&self, key: &str, label: &str, data: &[u8]) -> Result<(), BackendError> {
        let mut items = self.items.lock().expect("memory keyring lock poisoned");
        items.insert(
            key.to_string(),
            StoredItem {
                label: label.to_string(),
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        let items = self.items.lock().expect("memory keyring lock poisoned");
        items
            .get(key)
            .map(|item| item.data.clone())
            .ok_or_else(|| BackendError::NotFound {
                key: key.to_string(),
            })
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let mut items = self.items.lock().expect("memory keyring lock poisoned");
        match items.remove(key) {
            Some(_) => Ok(()),
            None => Err(BackendError::NotFound {
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_existing_item() -> anyhow::Result<()> {
        let keyring = MemoryKeyring::new();
        keyring.set("k", "first", b"one")?;
        keyring.set("k", "second", b"two")?;

        assert_eq!(keyring.len(), 1);
        assert_eq!(keyring.get("k")?, b"two".to_vec());
        assert_eq!(keyring.label("k").as_deref(), Some("second"));
        Ok(())
    }

    #[test]
    fn test_missing_key() {
        let keyring = MemoryKeyring::new();

        assert!(matches!(keyring.get("k"), Err(BackendError::NotFound { .. })));
        assert!(matches!(keyring.remove("k"), Err(BackendError::NotFound { .. })));
    }

    #[test]
    fn test_clones_share_items() -> anyhow::Result<()> {
        let keyring = MemoryKeyring::new();
        let handle = keyring.clone();

        keyring.set("k", "l", b"v")?;
        assert_eq!(handle.raw("k"), Some(b"v".to_vec()));

        handle.remove("k")?;
        assert!(keyring.is_empty());
        Ok(())
    }
}
