//! Key/value persistence contracts for structure records, coordinate files
//! and item sets.
//!
//! A [`RecordStore`] only promises atomic get/put of individual keys. Key
//! layout lives in [`keys::KeyProvider`]; JSON encoding is layered on top by
//! [`JsonStoreExt`].

pub mod filesystem;
pub mod itemset;
pub mod keys;
pub mod memory;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use filesystem::FilesystemStore;
pub use itemset::{ItemSet, ItemSetMetadata, ItemSetStore};
pub use keys::KeyProvider;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error for key '{key}': {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },
    #[error("JSON error for key '{key}': {source}")]
    Json {
        key: String,
        source: serde_json::Error,
    },
    #[error("Value for key '{key}' is not valid UTF-8")]
    Utf8 { key: String },
    #[error("Invalid key '{0}'")]
    InvalidKey(String),
    #[error("Store lock was poisoned")]
    Poisoned,
}

pub trait RecordStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

pub trait JsonStoreExt: RecordStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Json {
                    key: key.to_string(),
                    source: e,
                }),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Json {
            key: key.to_string(),
            source: e,
        })?;
        self.put(key, &bytes)
    }

    fn get_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.get(key)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Utf8 {
                    key: key.to_string(),
                }),
            None => Ok(None),
        }
    }
}

impl<S: RecordStore + ?Sized> JsonStoreExt for S {}
