//! SQLite-backed store.
//!
//! One `kv` table, accessed through `sqlx`. The store owns a small tokio
//! runtime and exposes the synchronous [`KeyValueStore`] API on top of it, so
//! callers never need to be async.
//!
//! Change notifications reach subscribers of this handle only; another
//! process writing the same file is not observed.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::runtime::Runtime;

use bodega_events::{ChangeBus, InMemoryChangeBus, StorageEvent, Subscription};

use super::{KeyValueStore, StorageError, StorageResult};

#[derive(Debug)]
pub struct SqliteStore {
    runtime: Runtime,
    pool: SqlitePool,
    bus: InMemoryChangeBus<StorageEvent>,
}

fn backend(context: &str) -> impl FnOnce(sqlx::Error) -> StorageError + '_ {
    move |e| StorageError::Backend(format!("{context}: {e}"))
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Backend(format!(
                        "failed to create store directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect(options)
    }

    /// Private in-memory database (tests).
    pub fn open_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(backend("invalid sqlite options"))?;
        Self::connect(options)
    }

    fn connect(options: SqliteConnectOptions) -> StorageResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::Backend(format!("failed to start store runtime: {e}")))?;

        // A single long-lived connection: writes are serialized anyway, and an
        // in-memory database only lives as long as its connection.
        let pool = runtime
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None::<Duration>)
                    .max_lifetime(None::<Duration>)
                    .connect_with(options),
            )
            .map_err(backend("failed to open sqlite store"))?;

        runtime
            .block_on(
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS kv (
                        key        TEXT PRIMARY KEY NOT NULL,
                        value      TEXT NOT NULL,
                        updated_at TEXT NOT NULL
                    )
                    "#,
                )
                .execute(&pool),
            )
            .map_err(backend("failed to create kv table"))?;

        Ok(Self {
            runtime,
            pool,
            bus: InMemoryChangeBus::new(),
        })
    }

    fn publish(&self, event: StorageEvent) {
        if let Err(err) = self.bus.publish(event) {
            tracing::warn!(error = ?err, "failed to publish storage change");
        }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.runtime.block_on(async {
            let row = sqlx::query("SELECT value FROM kv WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend("failed to read key"))?;

            match row {
                Some(row) => Ok(Some(
                    row.try_get::<String, _>("value")
                        .map_err(backend("failed to decode value"))?,
                )),
                None => Ok(None),
            }
        })
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let old = self.runtime.block_on(async {
            let mut tx = self.pool.begin().await.map_err(backend("failed to begin write"))?;

            let old: Option<String> = sqlx::query("SELECT value FROM kv WHERE key = ?1")
                .bind(key)
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend("failed to read key"))?
                .map(|row| row.try_get::<String, _>("value"))
                .transpose()
                .map_err(backend("failed to decode value"))?;

            if old.as_deref() == Some(value) {
                return Ok::<_, StorageError>(None);
            }

            sqlx::query(
                r#"
                INSERT INTO kv (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key)
                DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(backend("failed to write key"))?;

            tx.commit().await.map_err(backend("failed to commit write"))?;
            Ok(Some(old))
        })?;

        if let Some(old) = old {
            self.publish(StorageEvent::new(key, old, Some(value.to_string())));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let old = self.runtime.block_on(async {
            let row = sqlx::query("DELETE FROM kv WHERE key = ?1 RETURNING value")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend("failed to remove key"))?;

            row.map(|row| row.try_get::<String, _>("value"))
                .transpose()
                .map_err(backend("failed to decode value"))
        })?;

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
    fn persists_values_and_notifies() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sub = store.subscribe();

        store.set("productos-listado", "[]").unwrap();
        store.set("productos-listado", "[]").unwrap();
        assert_eq!(store.get("productos-listado").unwrap().as_deref(), Some("[]"));

        store.remove("productos-listado").unwrap();
        assert_eq!(store.get("productos-listado").unwrap(), None);

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].new_value.as_deref(), Some("[]"));
        assert!(events[1].is_removal());
    }

    #[test]
    fn updates_replace_previous_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("k", "1").unwrap();
        store.set("k", "2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));
    }
}
