use bodega_sales::{NewSale, SalesLog};

use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// Read access to the sales log, plus appending for the point of sale.
#[derive(Debug, Clone)]
pub struct SalesLogStore<S> {
    store: S,
    key: String,
}

impl<S> SalesLogStore<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current log, or `None` when absent or unreadable.
    ///
    /// Only a failing backend is an error; bad content is not.
    pub fn read(&self) -> StorageResult<Option<SalesLog>> {
        let raw = self.store.get(&self.key)?;
        let log = SalesLog::decode(raw.as_deref());
        if raw.is_some() && log.is_none() {
            tracing::warn!(key = %self.key, "sales log is not a JSON array; ignoring it");
        }
        Ok(log)
    }

    /// Append a sale. Returns the new log length.
    ///
    /// Refuses to append to a log it cannot decode, since rewriting it would
    /// drop every earlier sale.
    pub fn record(&self, sale: &NewSale) -> StorageResult<usize> {
        let mut log = match self.store.get(&self.key)? {
            None => SalesLog::new(),
            Some(raw) => SalesLog::decode(Some(&raw)).ok_or_else(|| StorageError::Corrupt {
                key: self.key.clone(),
                reason: "sales log is not a JSON array".to_string(),
            })?,
        };
        let len = log.append(sale).map_err(|e| StorageError::Encode {
            key: self.key.clone(),
            reason: e.to_string(),
        })?;
        self.store.set(&self.key, &log.encode())?;
        tracing::debug!(key = %self.key, len, "sale recorded");
        Ok(len)
    }
}
