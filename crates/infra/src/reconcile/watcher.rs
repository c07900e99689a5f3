//! Keep the inventory reconciled while the app runs.

use bodega_events::StorageEvent;

use super::cursor_store::CursorStore;
use super::sales_reconciler::{ReconcileError, ReconcileReport, SalesReconciler};
use crate::storage::KeyValueStore;
use crate::workers::{KeyWatcher, WorkerHandle};

/// Runs the reconciler once at start, then after every sales-log change.
#[derive(Debug)]
pub struct ReconcileWatcher;

impl ReconcileWatcher {
    pub fn spawn<S, C>(reconciler: SalesReconciler<S, C>, store: &S) -> std::io::Result<WorkerHandle>
    where
        S: KeyValueStore + Send + 'static,
        C: CursorStore + 'static,
    {
        Self::spawn_with_observer(reconciler, store, |_| {})
    }

    /// Like [`spawn`](Self::spawn), also handing every run's result to `observer`.
    pub fn spawn_with_observer<S, C, O>(
        reconciler: SalesReconciler<S, C>,
        store: &S,
        mut observer: O,
    ) -> std::io::Result<WorkerHandle>
    where
        S: KeyValueStore + Send + 'static,
        C: CursorStore + 'static,
        O: FnMut(&Result<ReconcileReport, ReconcileError>) + Send + 'static,
    {
        let sub = store.subscribe();
        let key = reconciler.sales_key().to_string();

        KeyWatcher::spawn("sales-reconciler", sub, key, move |change: Option<StorageEvent>| {
            if let Some(change) = &change {
                tracing::debug!(key = %change.key, "sales log changed");
            }
            let result = reconciler.reconcile();
            observer(&result);
            result.map(|_| ())
        })
    }
}
