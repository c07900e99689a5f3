use bodega_core::{DomainError, ProductId};
use bodega_products::{NewProduct, Product, UpdateProduct, default_catalog, ensure_unique_ids};

use super::RepositoryError;
use crate::storage::json::{read_json, write_json};
use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// CRUD over the product list stored under one key.
///
/// Every mutation reads the full list, changes it, and writes it back.
#[derive(Debug, Clone)]
pub struct ProductRepository<S> {
    store: S,
    key: String,
}

impl<S> ProductRepository<S>
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

    /// Current list; the default catalog when nothing is stored yet.
    ///
    /// A stored list that does not decode is an error, never replaced.
    pub fn list(&self) -> StorageResult<Vec<Product>> {
        let products = read_json::<Vec<Product>, _>(&self.store, &self.key)?.unwrap_or_else(default_catalog);
        if let Err(err) = ensure_unique_ids(&products) {
            tracing::warn!(key = %self.key, error = %err, "product list contains duplicate ids");
        }
        Ok(products)
    }

    /// Persist the default catalog if no list exists yet.
    ///
    /// Returns `true` when the catalog was written.
    pub fn ensure_seeded(&self) -> StorageResult<bool> {
        if self.store.get(&self.key)?.is_some() {
            return Ok(false);
        }
        self.save_all(&default_catalog())?;
        tracing::info!(key = %self.key, "seeded default product catalog");
        Ok(true)
    }

    pub fn get(&self, product_id: &ProductId) -> StorageResult<Option<Product>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|p| p.product_id() == product_id))
    }

    pub fn save_all(&self, products: &[Product]) -> StorageResult<()> {
        write_json(&self.store, &self.key, products)
    }

    pub fn create(&self, cmd: NewProduct) -> Result<Product, RepositoryError> {
        let product = self.mutate(|products| -> Result<_, RepositoryError> {
            let product = Product::create(&cmd, products)?;
            products.push(product.clone());
            Ok((product, true))
        })?;
        tracing::info!(product_id = %product.product_id(), "product registered");
        Ok(product)
    }

    pub fn update(&self, product_id: &ProductId, cmd: UpdateProduct) -> Result<Product, RepositoryError> {
        self.modify(product_id, |p| p.apply_update(&cmd))
    }

    /// Quick edit of the on-hand quantity only.
    pub fn set_quantity(&self, product_id: &ProductId, quantity: u64) -> Result<Product, RepositoryError> {
        self.modify(product_id, |p| {
            p.set_quantity(quantity);
            Ok(())
        })
    }

    pub fn delete(&self, product_id: &ProductId) -> Result<Product, RepositoryError> {
        let removed = self.mutate(|products| -> Result<_, RepositoryError> {
            let idx = products
                .iter()
                .position(|p| p.product_id() == product_id)
                .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;
            Ok((products.remove(idx), true))
        })?;
        tracing::info!(product_id = %product_id, "product deleted");
        Ok(removed)
    }

    /// Read-modify-write of the whole list.
    ///
    /// Every change to stored products, CRUD edits and [`StoredInventory`]
    /// stock movements alike, goes through here. `f` returns its result and
    /// whether the list changed; an unchanged list is not written.
    ///
    /// [`StoredInventory`]: super::StoredInventory
    pub(crate) fn mutate<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Vec<Product>) -> Result<(T, bool), E>,
        E: From<StorageError>,
    {
        let mut products = self.list()?;
        let (value, changed) = f(&mut products)?;
        if changed {
            self.save_all(&products)?;
        }
        Ok(value)
    }

    fn modify<F>(&self, product_id: &ProductId, f: F) -> Result<Product, RepositoryError>
    where
        F: FnOnce(&mut Product) -> Result<(), DomainError>,
    {
        self.mutate(|products| -> Result<_, RepositoryError> {
            let product = products
                .iter_mut()
                .find(|p| p.product_id() == product_id)
                .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;
            let before = product.clone();
            f(product)?;
            Ok((product.clone(), *product != before))
        })
    }
}
