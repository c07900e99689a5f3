//! Inventory service contract.
//!
//! Stock movements (manual counts, signed adjustments, reconciliation against
//! the sales log) go through an [`InventoryService`]. Its stored
//! implementation shares one write path with product edits, so there is a
//! single place to add locking or a transactional store later.

use bodega_core::ProductId;

use crate::adjustments::StockAdjustments;
use crate::stock::{BatchOutcome, clamp_decrement};

/// Result of a single signed adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustmentOutcome {
    pub previous: u64,
    pub current: u64,
    /// Units removed beyond what was on hand (quantity clamped to zero).
    pub oversold: Option<u64>,
}

impl AdjustmentOutcome {
    /// Compute the effect of `delta` on `on_hand`.
    ///
    /// Positive deltas add stock, negative deltas remove it and clamp at zero.
    pub fn compute(on_hand: u64, delta: i64) -> Self {
        if delta >= 0 {
            return Self {
                previous: on_hand,
                current: on_hand.saturating_add(delta.unsigned_abs()),
                oversold: None,
            };
        }
        let (current, oversold) = clamp_decrement(on_hand, delta.unsigned_abs());
        Self {
            previous: on_hand,
            current,
            oversold,
        }
    }

    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Single consistency point for stock mutation.
pub trait InventoryService {
    type Error: core::fmt::Debug;

    /// Current on-hand quantity, `None` for unknown products.
    fn get_quantity(&self, product_id: &ProductId) -> Result<Option<u64>, Self::Error>;

    /// Add (`delta > 0`) or remove (`delta < 0`) stock, clamped at zero.
    fn apply_adjustment(
        &self,
        product_id: &ProductId,
        delta: i64,
    ) -> Result<AdjustmentOutcome, Self::Error>;

    /// Overwrite the on-hand quantity (manual count).
    fn set_quantity(&self, product_id: &ProductId, quantity: u64) -> Result<(), Self::Error>;

    /// Remove a batch of sold units with a single write.
    ///
    /// Implementations persist only when at least one quantity changed.
    fn apply_batch(&self, adjustments: &StockAdjustments) -> Result<BatchOutcome, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_delta_restocks() {
        let o = AdjustmentOutcome::compute(10, 5);
        assert_eq!((o.previous, o.current, o.oversold), (10, 15, None));
    }

    #[test]
    fn negative_delta_clamps_and_reports_excess() {
        let o = AdjustmentOutcome::compute(10, -15);
        assert_eq!((o.current, o.oversold), (0, Some(5)));
        assert!(o.changed());
    }

    #[test]
    fn extreme_deltas_do_not_overflow() {
        assert_eq!(AdjustmentOutcome::compute(u64::MAX, i64::MAX).current, u64::MAX);
        assert_eq!(AdjustmentOutcome::compute(3, i64::MIN).current, 0);
    }
}
