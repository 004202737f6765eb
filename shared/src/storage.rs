use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Asynchronous JSON key-value persistence.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// `Ok(None)` when nothing is stored under `key`.
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;

    async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError>;
}

/// Process-local store holding raw JSON strings.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    reject_writes: Cell<bool>,
}

impl MemoryStore {
    /// Make every following `set` fail with [`StorageError::Unavailable`].
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, json: impl Into<String>) {
        self.entries.borrow_mut().insert(key.to_owned(), json.into());
    }
}

impl KeyValueStore for MemoryStore {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(json) = self.raw(key) else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(StorageError::Deserialize)
    }

    async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        if self.reject_writes.get() {
            return Err(StorageError::Unavailable(format!("write to {key} rejected")));
        }
        let json = serde_json::to_string(value).map_err(StorageError::Serialize)?;
        self.insert_raw(key, json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let store = MemoryStore::default();
        let value: Option<Vec<u32>> = block_on(store.get("boxes")).expect("read");
        assert_eq!(value, None);
    }

    #[test]
    fn set_then_get_returns_value() {
        let store = MemoryStore::default();
        block_on(store.set("flag", &true)).expect("write");
        assert_eq!(store.raw("flag").as_deref(), Some("true"));
        let value: Option<bool> = block_on(store.get("flag")).expect("read");
        assert_eq!(value, Some(true));
    }

    #[test]
    fn rejected_write_leaves_previous_value() {
        let store = MemoryStore::default();
        store.insert_raw("flag", "false");
        store.reject_writes(true);
        let err = block_on(store.set("flag", &true)).expect_err("write should fail");
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert_eq!(store.raw("flag").as_deref(), Some("false"));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let store = MemoryStore::default();
        store.insert_raw("boxes", "{not json");
        let err = block_on(store.get::<Vec<u32>>("boxes")).expect_err("decode should fail");
        assert!(matches!(err, StorageError::Deserialize(_)));
    }
}
