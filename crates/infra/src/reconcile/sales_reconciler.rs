//! Folding the sales log into on-hand quantities.

use serde::Serialize;
use thiserror::Error;

use bodega_core::ProductId;
use bodega_inventory::{AppliedAdjustment, BatchOutcome, InventoryService, StockAdjustments, StockNotice};

use super::cursor_store::{CursorStore, KvCursorStore};
use crate::config::StorageKeys;
use crate::repository::{ProductRepository, RepositoryError, SalesLogStore, StoredInventory};
use crate::storage::{KeyValueStore, StorageError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to read reconciliation state: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to update inventory: {0}")]
    Inventory(#[from] RepositoryError),

    /// Inventory was written but the cursor was not: rerunning now would apply
    /// the same sales twice.
    #[error("inventory updated but cursor could not be advanced to {target}: {source}")]
    CursorNotAdvanced { target: u64, source: StorageError },
}

/// What a run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// No sales log, or one that is not a list.
    NoSalesLog,
    /// Every entry was already applied.
    UpToDate,
    /// The cursor is past the end of the log; nothing applied, cursor kept.
    LogTruncated { cursor: u64, log_len: u64 },
    /// `records` new entries were applied.
    Applied { records: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub outcome: ReconcileOutcome,
    pub cursor_before: u64,
    pub cursor_after: u64,
    pub adjustments: Vec<AppliedAdjustment>,
    pub unknown_products: Vec<ProductId>,
}

impl ReconcileReport {
    fn unchanged(outcome: ReconcileOutcome, cursor: u64) -> Self {
        Self {
            outcome,
            cursor_before: cursor,
            cursor_after: cursor,
            adjustments: Vec::new(),
            unknown_products: Vec::new(),
        }
    }

    pub fn notices(&self) -> Vec<StockNotice> {
        self.adjustments.iter().filter_map(AppliedAdjustment::notice).collect()
    }

    pub fn oversold(&self) -> impl Iterator<Item = &AppliedAdjustment> {
        self.adjustments.iter().filter(|a| a.oversold.is_some())
    }
}

/// Applies newly appended sales to the inventory exactly once per cursor.
///
/// A run:
/// 1. reads the sales log (absent / not a list: no-op)
/// 2. reads the cursor (absent / garbage: 0)
/// 3. sums units sold per product over entries at positions `>= cursor`
/// 4. lowers each product by its total, clamped at zero, writing the product
///    list only if a quantity changed
/// 5. stores the log length as the new cursor
///
/// Runs are idempotent: with no new entries nothing is written.
#[derive(Debug, Clone)]
pub struct SalesReconciler<S, C = KvCursorStore<S>> {
    sales: SalesLogStore<S>,
    inventory: StoredInventory<S>,
    cursor: C,
}

impl<S> SalesReconciler<S, KvCursorStore<S>>
where
    S: KeyValueStore + Clone,
{
    /// Wire a reconciler to `store` using `keys`.
    pub fn new(store: S, keys: &StorageKeys) -> Self {
        Self::with_parts(
            SalesLogStore::new(store.clone(), keys.sales.clone()),
            StoredInventory::new(ProductRepository::new(store.clone(), keys.products.clone())),
            KvCursorStore::new(store, keys.cursor.clone()),
        )
    }
}

impl<S, C> SalesReconciler<S, C>
where
    S: KeyValueStore,
    C: CursorStore,
{
    pub fn with_parts(sales: SalesLogStore<S>, inventory: StoredInventory<S>, cursor: C) -> Self {
        Self {
            sales,
            inventory,
            cursor,
        }
    }

    /// Storage key whose changes should trigger a run.
    pub fn sales_key(&self) -> &str {
        self.sales.key()
    }

    pub fn inventory(&self) -> &StoredInventory<S> {
        &self.inventory
    }

    pub fn reconcile(&self) -> Result<ReconcileReport, ReconcileError> {
        let log = self.sales.read()?;
        let cursor = self.cursor.load()?;

        let Some(log) = log else {
            tracing::debug!(key = %self.sales.key(), cursor, "no sales log; nothing to reconcile");
            return Ok(ReconcileReport::unchanged(ReconcileOutcome::NoSalesLog, cursor));
        };

        let log_len = log.len() as u64;

        if cursor > log_len {
            tracing::warn!(cursor, log_len, "sales log is shorter than the cursor; skipping run");
            return Ok(ReconcileReport::unchanged(
                ReconcileOutcome::LogTruncated { cursor, log_len },
                cursor,
            ));
        }
        if cursor == log_len {
            return Ok(ReconcileReport::unchanged(ReconcileOutcome::UpToDate, cursor));
        }

        // cursor < log_len, so it fits in usize.
        let adjustments = StockAdjustments::from_sales(log.records_since(cursor as usize));
        let batch: BatchOutcome = self.inventory.apply_batch(&adjustments)?;

        if let Err(source) = self.cursor.store(log_len) {
            if batch.changed() {
                tracing::error!(target_cursor = log_len, error = %source, "cursor write failed after inventory update");
                return Err(ReconcileError::CursorNotAdvanced {
                    target: log_len,
                    source,
                });
            }
            return Err(ReconcileError::Storage(source));
        }

        let report = ReconcileReport {
            outcome: ReconcileOutcome::Applied {
                records: log_len - cursor,
            },
            cursor_before: cursor,
            cursor_after: log_len,
            adjustments: batch.applied,
            unknown_products: batch.unknown_products,
        };

        for notice in report.notices() {
            tracing::info!(product_id = %notice.product_id, sold = notice.sold, "{notice}");
        }
        for oversold in report.oversold() {
            tracing::warn!(
                product_id = %oversold.product_id,
                sold = oversold.sold,
                on_hand = oversold.previous,
                excess = oversold.oversold.unwrap_or(0),
                "sales exceed stock on hand; quantity clamped to zero"
            );
        }
        if !report.unknown_products.is_empty() {
            tracing::warn!(products = ?report.unknown_products, "sales reference unknown products");
        }
        tracing::info!(
            cursor_before = report.cursor_before,
            cursor_after = report.cursor_after,
            adjusted = report.adjustments.len(),
            "sales reconciled"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bodega_events::{StorageEvent, Subscription};
    use bodega_products::{NewProduct, Product, default_catalog};

    use crate::storage::{InMemoryStore, StorageResult};
    use crate::storage::json::write_json;

    fn pid(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn product(id: &str, quantity: u64) -> Product {
        Product::create(
            &NewProduct {
                id: pid(id),
                name: format!("prod {id}"),
                quantity,
                price: None,
            },
            &[],
        )
        .unwrap()
    }

    fn setup(products: &[Product], cursor: Option<&str>, sales: Option<&str>) -> (Arc<InMemoryStore>, SalesReconciler<Arc<InMemoryStore>>) {
        let store = Arc::new(InMemoryStore::new());
        let keys = StorageKeys::default();
        write_json(&*store, &keys.products, products).unwrap();
        if let Some(c) = cursor {
            store.set(&keys.cursor, c).unwrap();
        }
        if let Some(s) = sales {
            store.set(&keys.sales, s).unwrap();
        }
        let reconciler = SalesReconciler::new(store.clone(), &keys);
        (store, reconciler)
    }

    fn quantity(r: &SalesReconciler<Arc<InMemoryStore>>, id: &str) -> u64 {
        r.inventory().get_quantity(&pid(id)).unwrap().unwrap()
    }

    fn cursor(store: &InMemoryStore) -> Option<String> {
        store.get("ventas-aplicadas-count").unwrap()
    }

    #[test]
    fn applies_new_sale_and_advances_cursor() {
        let (store, r) = setup(
            &[product("P-001", 500)],
            Some("0"),
            Some(r#"[{"items":[{"id":"P-001","cantidad":50}]}]"#),
        );

        let report = r.reconcile().unwrap();

        assert_eq!(report.outcome, ReconcileOutcome::Applied { records: 1 });
        assert_eq!(quantity(&r, "P-001"), 450);
        assert_eq!(cursor(&store).as_deref(), Some("1"));
        assert_eq!(report.notices()[0].to_string(), "prod P-001: -50 units from sales");
    }

    #[test]
    fn second_run_without_new_sales_changes_nothing() {
        let (store, r) = setup(
            &[product("P-001", 500)],
            Some("0"),
            Some(r#"[{"items":[{"id":"P-001","cantidad":50}]}]"#),
        );
        r.reconcile().unwrap();
        let sub = store.subscribe();

        let report = r.reconcile().unwrap();

        assert_eq!(report.outcome, ReconcileOutcome::UpToDate);
        assert_eq!(quantity(&r, "P-001"), 450);
        assert_eq!(cursor(&store).as_deref(), Some("1"));
        assert!(sub.drain().is_empty(), "an idempotent run must not write");
    }

    #[test]
    fn oversell_clamps_to_zero_and_is_reported() {
        let (_, r) = setup(
            &[product("P-001", 10)],
            None,
            Some(r#"[{"items":[{"id":"P-001","cantidad":15}]}]"#),
        );

        let report = r.reconcile().unwrap();

        assert_eq!(quantity(&r, "P-001"), 0);
        assert_eq!(report.adjustments[0].oversold, Some(5));
    }

    #[test]
    fn multiple_records_for_one_product_are_combined() {
        let (store, r) = setup(
            &[product("P-002", 300)],
            Some("0"),
            Some(r#"[{"items":[{"id":"P-002","cantidad":3}]},{"items":[{"id":"P-002","cantidad":4}]}]"#),
        );
        let sub = store.subscribe();

        let report = r.reconcile().unwrap();

        assert_eq!(quantity(&r, "P-002"), 293);
        assert_eq!(report.adjustments.len(), 1);
        assert_eq!(report.adjustments[0].sold, 7);
        let product_writes = sub
            .drain()
            .into_iter()
            .filter(|e| e.key == "productos-listado")
            .count();
        assert_eq!(product_writes, 1);
    }

    #[test]
    fn only_entries_past_the_cursor_are_applied() {
        let (store, r) = setup(
            &[product("P-001", 100)],
            Some("1"),
            Some(r#"[{"items":[{"id":"P-001","cantidad":60}]},{"items":[{"id":"P-001","cantidad":5}]}]"#),
        );

        r.reconcile().unwrap();

        assert_eq!(quantity(&r, "P-001"), 95);
        assert_eq!(cursor(&store).as_deref(), Some("2"));
    }

    #[test]
    fn missing_or_malformed_log_is_a_no_op() {
        for sales in [None, Some("garbage"), Some(r#"{"items":[]}"#)] {
            let (store, r) = setup(&[product("P-001", 5)], None, sales);
            let report = r.reconcile().unwrap();
            assert_eq!(report.outcome, ReconcileOutcome::NoSalesLog);
            assert_eq!(cursor(&store), None);
        }
    }

    #[test]
    fn missing_log_reports_the_stored_cursor() {
        let (store, r) = setup(&[product("P-001", 5)], Some("4"), None);

        let report = r.reconcile().unwrap();

        assert_eq!(report.outcome, ReconcileOutcome::NoSalesLog);
        assert_eq!((report.cursor_before, report.cursor_after), (4, 4));
        assert_eq!(cursor(&store).as_deref(), Some("4"));
    }

    #[test]
    fn correction_entries_offset_earlier_sales() {
        let (_, r) = setup(
            &default_catalog(),
            Some("0"),
            Some(r#"[{"items":[{"id":"P-001","cantidad":5}]},{"items":[{"id":"P-001","cantidad":-3}]}]"#),
        );

        let report = r.reconcile().unwrap();

        assert_eq!(quantity(&r, "P-001"), 498);
        assert_eq!(report.adjustments[0].sold, 2);
    }

    #[test]
    fn fractional_quantities_are_summed_before_truncating() {
        let (_, r) = setup(
            &[product("P-001", 10)],
            None,
            Some(r#"[{"items":[{"id":"P-001","cantidad":2.5}]},{"items":[{"id":"P-001","cantidad":"2.5"}]}]"#),
        );

        r.reconcile().unwrap();

        assert_eq!(quantity(&r, "P-001"), 5);
    }

    #[test]
    fn legacy_product_rows_do_not_block_the_run() {
        let (store, r) = setup(&[], None, Some(r#"[{"items":[{"id":"P-001","cantidad":1}]}]"#));
        store
            .set(
                "productos-listado",
                r#"[{"id":"P-001","nombre":"a","cantidad":500},{"id":" P-009 ","nombre":"b","cantidad":12.5}]"#,
            )
            .unwrap();

        r.reconcile().unwrap();

        assert_eq!(quantity(&r, "P-001"), 499);
        assert_eq!(quantity(&r, "P-009"), 12);
        assert_eq!(cursor(&store).as_deref(), Some("1"));
    }

    #[test]
    fn garbage_cursor_counts_as_zero() {
        let (store, r) = setup(
            &[product("P-001", 5)],
            Some("\"tres\""),
            Some(r#"[{"items":[{"id":"P-001","cantidad":1}]}]"#),
        );

        r.reconcile().unwrap();

        assert_eq!(quantity(&r, "P-001"), 4);
        assert_eq!(cursor(&store).as_deref(), Some("1"));
    }

    #[test]
    fn cursor_advances_even_when_no_product_matches() {
        let (store, r) = setup(
            &[product("P-001", 5)],
            None,
            Some(r#"[{"items":[{"id":"P-404","cantidad":1}]},{"total":3}]"#),
        );
        let sub = store.subscribe();

        let report = r.reconcile().unwrap();

        assert_eq!(report.unknown_products, vec![pid("P-404")]);
        assert_eq!(cursor(&store).as_deref(), Some("2"));
        let keys: Vec<_> = sub.drain().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["ventas-aplicadas-count".to_string()]);
    }

    #[test]
    fn truncated_log_never_rewinds_the_cursor() {
        let (store, r) = setup(
            &[product("P-001", 5)],
            Some("3"),
            Some(r#"[{"items":[{"id":"P-001","cantidad":1}]}]"#),
        );

        let report = r.reconcile().unwrap();

        assert_eq!(report.outcome, ReconcileOutcome::LogTruncated { cursor: 3, log_len: 1 });
        assert_eq!(quantity(&r, "P-001"), 5);
        assert_eq!(cursor(&store).as_deref(), Some("3"));
    }

    #[test]
    fn corrupt_inventory_stops_the_run_before_the_cursor_moves() {
        let (store, r) = setup(&[], None, Some(r#"[{"items":[{"id":"P-001","cantidad":1}]}]"#));
        store.set("productos-listado", "not json").unwrap();

        assert!(matches!(r.reconcile(), Err(ReconcileError::Inventory(_))));
        assert_eq!(cursor(&store), None);
        assert_eq!(store.get("productos-listado").unwrap().as_deref(), Some("not json"));
    }

    /// Store wrapper whose writes to one key always fail.
    struct FailingKey {
        inner: InMemoryStore,
        key: &'static str,
    }

    impl KeyValueStore for FailingKey {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            if key == self.key {
                return Err(StorageError::QuotaExceeded { limit: 0, required: value.len() });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            self.inner.remove(key)
        }

        fn subscribe(&self) -> Subscription<StorageEvent> {
            self.inner.subscribe()
        }
    }

    fn failing(key: &'static str) -> SalesReconciler<Arc<FailingKey>> {
        let inner = InMemoryStore::new();
        inner
            .set("ventas-listado", r#"[{"items":[{"id":"P-001","cantidad":2}]}]"#)
            .unwrap();
        SalesReconciler::new(Arc::new(FailingKey { inner, key }), &StorageKeys::default())
    }

    #[test]
    fn failed_product_write_leaves_cursor_untouched() {
        let r = failing("productos-listado");

        assert!(matches!(r.reconcile(), Err(ReconcileError::Inventory(_))));
        assert_eq!(r.cursor.load().unwrap(), 0);
    }

    #[test]
    fn failed_cursor_write_after_inventory_update_is_flagged() {
        let r = failing("ventas-aplicadas-count");

        let err = r.reconcile().unwrap_err();
        assert!(matches!(err, ReconcileError::CursorNotAdvanced { target: 1, .. }));
        assert_eq!(r.inventory().get_quantity(&pid("P-001")).unwrap(), Some(498));
    }
}
