use bodega_core::{DomainError, ProductId};
use bodega_inventory::{AdjustmentOutcome, BatchOutcome, InventoryService, StockAdjustments, apply_batch};

use super::{ProductRepository, RepositoryError};
use crate::storage::KeyValueStore;

/// [`InventoryService`] over the stored product list.
///
/// Quantities live inside the product records, so every operation runs
/// through [`ProductRepository::mutate`], the same read-modify-write path that
/// CRUD edits use. That path is the single point where stored quantities change.
#[derive(Debug, Clone)]
pub struct StoredInventory<S> {
    products: ProductRepository<S>,
}

impl<S> StoredInventory<S>
where
    S: KeyValueStore,
{
    pub fn new(products: ProductRepository<S>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &ProductRepository<S> {
        &self.products
    }
}

impl<S> InventoryService for StoredInventory<S>
where
    S: KeyValueStore,
{
    type Error = RepositoryError;

    fn get_quantity(&self, product_id: &ProductId) -> Result<Option<u64>, Self::Error> {
        Ok(self.products.get(product_id)?.map(|p| p.quantity()))
    }

    fn apply_adjustment(&self, product_id: &ProductId, delta: i64) -> Result<AdjustmentOutcome, Self::Error> {
        self.products.mutate(|list| -> Result<_, RepositoryError> {
            let product = list
                .iter_mut()
                .find(|p| p.product_id() == product_id)
                .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;

            let outcome = AdjustmentOutcome::compute(product.quantity(), delta);
            if let Some(excess) = outcome.oversold {
                tracing::warn!(product_id = %product_id, excess, "adjustment exceeds stock; clamped to zero");
            }
            product.set_quantity(outcome.current);
            Ok((outcome, outcome.changed()))
        })
    }

    fn set_quantity(&self, product_id: &ProductId, quantity: u64) -> Result<(), Self::Error> {
        self.products.set_quantity(product_id, quantity).map(|_| ())
    }

    fn apply_batch(&self, adjustments: &StockAdjustments) -> Result<BatchOutcome, Self::Error> {
        if adjustments.is_empty() {
            return Ok(BatchOutcome::default());
        }
        self.products.mutate(|list| -> Result<_, RepositoryError> {
            let outcome = apply_batch(list, adjustments);
            let changed = outcome.changed();
            Ok((outcome, changed))
        })
    }
}
