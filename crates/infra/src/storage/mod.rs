//! String-keyed persistent storage.
//!
//! The whole application persists through [`KeyValueStore`]: each record list
//! lives under one key as a JSON document and is rewritten in full on every
//! change. Stores announce every change as a [`StorageEvent`] so other
//! components can react to writes they did not make.

pub mod in_memory;
pub mod json;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::sync::Arc;

use bodega_events::{StorageEvent, Subscription};
use thiserror::Error;

pub use in_memory::InMemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use crate::config::StoreBackend;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded (limit: {limit} bytes, required: {required} bytes)")]
    QuotaExceeded { limit: usize, required: usize },

    #[error("value stored under {key:?} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("failed to encode value for {key:?}: {reason}")]
    Encode { key: String, reason: String },

    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("storage backend {0:?} is not available in this build")]
    Unsupported(String),
}

/// Synchronous string-keyed store with change notifications.
///
/// - `set`/`remove` publish a [`StorageEvent`] when the stored value changed
/// - Writing an identical value publishes nothing
/// - Notifications are delivered after the write is durable
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Receive every change made through this store from now on.
    fn subscribe(&self) -> Subscription<StorageEvent>;
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn subscribe(&self) -> Subscription<StorageEvent> {
        (**self).subscribe()
    }
}

/// Shared handle to whichever store the configuration selected.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Open the configured backend.
pub fn open_store(backend: &StoreBackend) -> StorageResult<SharedStore> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite(path) => Ok(Arc::new(SqliteStore::open(path)?)),
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite(path) => Err(StorageError::Unsupported(format!(
            "sqlite:{}",
            path.display()
        ))),
    }
}
