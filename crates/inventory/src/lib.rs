//! Inventory domain module.
//!
//! Folding sales into on-hand quantities, implemented purely as deterministic
//! domain logic (no IO, no storage). The infra crate wires it to the store.

pub mod adjustments;
pub mod notice;
pub mod service;
pub mod stock;

pub use adjustments::StockAdjustments;
pub use notice::StockNotice;
pub use service::{AdjustmentOutcome, InventoryService};
pub use stock::{AppliedAdjustment, BatchOutcome, apply_batch, clamp_decrement};
