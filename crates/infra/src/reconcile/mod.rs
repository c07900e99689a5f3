//! Inventory reconciliation against the sales log.
//!
//! The sales log is append-only from this side; a persisted cursor records how
//! much of it is already reflected in the product quantities, so every entry
//! is applied at most once per store.
//!
//! Two copies of the app sharing one store each keep reconciling on their own
//! and the last cursor write wins; there is no compare-and-swap, so a run that
//! races another one can double-apply a batch.

pub mod cursor_store;
pub mod sales_reconciler;
pub mod watcher;

pub use cursor_store::{CursorStore, KvCursorStore, parse_cursor};
pub use sales_reconciler::{ReconcileError, ReconcileOutcome, ReconcileReport, SalesReconciler};
pub use watcher::ReconcileWatcher;
