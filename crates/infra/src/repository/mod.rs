//! Record lists persisted under a single key each.

pub mod inventory;
pub mod products;
pub mod sales;

use thiserror::Error;

use bodega_core::DomainError;

use crate::storage::StorageError;

pub use inventory::StoredInventory;
pub use products::ProductRepository;
pub use sales::SalesLogStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
