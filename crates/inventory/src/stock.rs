//! Applying aggregated sales to a product list.

use serde::Serialize;

use bodega_core::ProductId;
use bodega_products::Product;

use crate::adjustments::StockAdjustments;
use crate::notice::StockNotice;
use crate::service::AdjustmentOutcome;

/// Result of applying one product's net sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedAdjustment {
    pub product_id: ProductId,
    pub name: String,
    /// Net units sold; negative when corrections outweigh sales.
    pub sold: i64,
    pub previous: u64,
    pub current: u64,
    /// Units sold beyond what was on hand. `Some` means the quantity was
    /// clamped to zero and the excess is not reflected anywhere else.
    pub oversold: Option<u64>,
}

impl AppliedAdjustment {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }

    /// Advisory notice, only for products whose quantity actually moved.
    pub fn notice(&self) -> Option<StockNotice> {
        self.changed().then(|| StockNotice {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            sold: self.sold,
        })
    }
}

/// Outcome of applying a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub applied: Vec<AppliedAdjustment>,
    /// Sold product ids with no matching product in the list.
    pub unknown_products: Vec<ProductId>,
}

impl BatchOutcome {
    /// `true` when at least one quantity changed (the list must be persisted).
    pub fn changed(&self) -> bool {
        self.applied.iter().any(AppliedAdjustment::changed)
    }

    pub fn notices(&self) -> Vec<StockNotice> {
        self.applied.iter().filter_map(AppliedAdjustment::notice).collect()
    }

    pub fn oversold(&self) -> impl Iterator<Item = &AppliedAdjustment> {
        self.applied.iter().filter(|a| a.oversold.is_some())
    }
}

/// Remove `sold` units from `on_hand`, never going below zero.
///
/// Returns the new quantity and the oversold excess, if any.
pub fn clamp_decrement(on_hand: u64, sold: u64) -> (u64, Option<u64>) {
    if sold > on_hand {
        (0, Some(sold - on_hand))
    } else {
        (on_hand - sold, None)
    }
}

/// Lower every referenced product by its combined sold total.
///
/// The new quantity is `max(0, on_hand - sold)`; a negative net total adds
/// stock back. Products not referenced by `adjustments` are left untouched.
pub fn apply_batch(products: &mut [Product], adjustments: &StockAdjustments) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for product in products.iter_mut() {
        let sold = adjustments.sold(product.product_id());
        if sold == 0 {
            continue;
        }
        let previous = product.quantity();
        let AdjustmentOutcome { current, oversold, .. } = AdjustmentOutcome::compute(previous, sold.saturating_neg());
        product.set_quantity(current);
        outcome.applied.push(AppliedAdjustment {
            product_id: product.product_id().clone(),
            name: product.name().to_string(),
            sold,
            previous,
            current,
            oversold,
        });
    }

    for (product_id, _) in adjustments.iter() {
        if !products.iter().any(|p| p.product_id() == product_id) {
            outcome.unknown_products.push(product_id.clone());
        }
    }

    outcome
}
