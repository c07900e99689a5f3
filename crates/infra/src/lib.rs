//! Infrastructure layer: storage backends, repositories, reconciliation, config.

pub mod config;
pub mod reconcile;
pub mod repository;
pub mod storage;
pub mod workers;


pub use config::{BodegaConfig, ConfigError, StorageKeys, StoreBackend};
pub use reconcile::{ReconcileError, ReconcileOutcome, ReconcileReport, ReconcileWatcher, SalesReconciler};
pub use repository::{ProductRepository, RepositoryError, SalesLogStore, StoredInventory};
pub use storage::{InMemoryStore, KeyValueStore, SharedStore, StorageError, open_store};
#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
