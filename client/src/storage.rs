use boxmap_shared::{KeyValueStore, StorageError};
use gloo_storage::errors::StorageError as BrowserStorageError;
use gloo_storage::{LocalStorage, Storage};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// `window.localStorage`, JSON-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStore;

impl KeyValueStore for BrowserStore {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match LocalStorage::get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(BrowserStorageError::KeyNotFound(_)) => Ok(None),
            Err(BrowserStorageError::SerdeError(e)) => Err(StorageError::Deserialize(e)),
            Err(e) => Err(StorageError::Unavailable(e.to_string())),
        }
    }

    async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        LocalStorage::set(key, value).map_err(|e| match e {
            BrowserStorageError::SerdeError(e) => StorageError::Serialize(e),
            other => StorageError::Unavailable(other.to_string()),
        })
    }
}
