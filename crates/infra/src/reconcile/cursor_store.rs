//! Reconciliation cursor persistence.
//!
//! The cursor counts how many sales-log entries are already folded into the
//! inventory. It enables:
//! - Idempotent runs (entries below the cursor are never applied again)
//! - Resume after restart (the next run continues from the stored offset)

use crate::storage::{KeyValueStore, StorageResult};

/// Persistence for the reconciliation cursor.
pub trait CursorStore: Send + Sync {
    /// Stored cursor; 0 when absent or unreadable.
    fn load(&self) -> StorageResult<u64>;

    /// Store a new cursor value.
    fn store(&self, cursor: u64) -> StorageResult<()>;
}

/// Cursor kept as a decimal string under one key.
#[derive(Debug, Clone)]
pub struct KvCursorStore<S> {
    store: S,
    key: String,
}

impl<S> KvCursorStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl<S> CursorStore for KvCursorStore<S>
where
    S: KeyValueStore,
{
    fn load(&self) -> StorageResult<u64> {
        Ok(self.store.get(&self.key)?.as_deref().map(parse_cursor).unwrap_or(0))
    }

    fn store(&self, cursor: u64) -> StorageResult<()> {
        self.store.set(&self.key, &cursor.to_string())
    }
}

/// Interpret a stored cursor.
///
/// Non-numeric, negative or non-finite values read as 0; fractions truncate.
pub fn parse_cursor(raw: &str) -> u64 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return n;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.trunc() as u64,
        _ => 0,
    }
}
