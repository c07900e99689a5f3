//! JSON documents on top of a [`KeyValueStore`].

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{KeyValueStore, StorageError, StorageResult};

/// Read and decode the document under `key`.
///
/// Absent keys are `Ok(None)`. A value that does not decode is
/// [`StorageError::Corrupt`]: callers that own the key must not silently
/// replace data they could not read.
pub fn read_json<T, S>(store: &S, key: &str) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// Encode `value` and store it under `key`.
pub fn write_json<T, S>(store: &S, key: &str, value: &T) -> StorageResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, &raw)
}
