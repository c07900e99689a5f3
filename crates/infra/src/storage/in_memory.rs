//! In-memory store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use bodega_events::{ChangeBus, InMemoryChangeBus, StorageEvent, Subscription};

use super::{KeyValueStore, StorageError, StorageResult};

/// `HashMap`-backed store with an optional size quota.
///
/// The quota counts key and value bytes of everything stored, which is how
/// browser storage limits behave; it lets tests exercise write failures.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<HashMap<String, String>>,
    bus: InMemoryChangeBus<StorageEvent>,
    quota: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would grow the stored bytes past `limit`.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::default()
        }
    }

    /// Bytes currently stored (keys + values).
    pub fn used_bytes(&self) -> usize {
        self.inner
            .read()
            .map(|m| m.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }

    fn publish(&self, event: StorageEvent) {
        if let Err(err) = self.bus.publish(event) {
            tracing::warn!(error = ?err, "failed to publish storage change");
        }
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let map = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let old = {
            let mut map = self.inner.write().map_err(|_| StorageError::Poisoned)?;
            let old = map.get(key).cloned();
            if old.as_deref() == Some(value) {
                return Ok(());
            }

            if let Some(limit) = self.quota {
                let used: usize = map.iter().map(|(k, v)| k.len() + v.len()).sum();
                let freed = old.as_ref().map(|v| key.len() + v.len()).unwrap_or(0);
                let required = used - freed + key.len() + value.len();
                if required > limit {
                    return Err(StorageError::QuotaExceeded { limit, required });
                }
            }

            map.insert(key.to_string(), value.to_string());
            old
        };

        self.publish(StorageEvent::new(key, old, Some(value.to_string())));
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let old = {
            let mut map = self.inner.write().map_err(|_| StorageError::Poisoned)?;
            map.remove(key)
        };

        if old.is_some() {
            self.publish(StorageEvent::new(key, old, None));
        }
        Ok(())
    }

    fn subscribe(&self) -> Subscription<StorageEvent> {
        self.bus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn changes_are_published_with_old_and_new_values() {
        let store = InMemoryStore::new();
        let sub = store.subscribe();

        store.set("k", "1").unwrap();
        store.set("k", "2").unwrap();
        store.remove("k").unwrap();

        let events = sub.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].old_value, None);
        assert_eq!(events[1].old_value.as_deref(), Some("1"));
        assert_eq!(events[1].new_value.as_deref(), Some("2"));
        assert!(events[2].is_removal());
    }

    #[test]
    fn unchanged_writes_and_missing_removals_are_silent() {
        let store = InMemoryStore::new();
        store.set("k", "same").unwrap();
        let sub = store.subscribe();

        store.set("k", "same").unwrap();
        store.remove("missing").unwrap();

        assert!(sub.drain().is_empty());
    }

    #[test]
    fn quota_rejects_oversized_writes_and_keeps_old_value() {
        let store = InMemoryStore::with_quota(10);
        store.set("k", "12345").unwrap();

        let err = store.set("k", "0123456789").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 10, required: 11 }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("12345"));

        // Replacing with a value of the same size fits.
        store.set("k", "54321").unwrap();
        assert_eq!(store.used_bytes(), 6);
    }
}
