//! Per-product totals sold across a batch of sale records.

use std::collections::BTreeMap;

use bodega_core::ProductId;
use bodega_sales::SaleRecord;

/// Units sold per product, summed over every record in a batch.
///
/// A product appearing in several records gets a single combined total, so the
/// inventory is decremented once per product per reconciliation run. Totals
/// are signed: a negative line (a correction) offsets earlier sales.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockAdjustments {
    sold: BTreeMap<ProductId, f64>,
}

impl StockAdjustments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate the line items of `records`.
    pub fn from_sales(records: impl IntoIterator<Item = SaleRecord>) -> Self {
        let mut adjustments = Self::new();
        for record in records {
            for line in record.items {
                adjustments.add(line.product_id, line.quantity);
            }
        }
        adjustments
    }

    /// Add `units` to the running total; non-finite values are ignored.
    pub fn add(&mut self, product_id: ProductId, units: f64) {
        if !units.is_finite() {
            return;
        }
        *self.sold.entry(product_id).or_insert(0.0) += units;
    }

    /// Net whole units sold for `product_id` (0 when not referenced).
    ///
    /// The combined total is truncated toward zero, so `2.5 + 2.5` counts as 5.
    pub fn sold(&self, product_id: &ProductId) -> i64 {
        self.sold.get(product_id).copied().map(whole_units).unwrap_or(0)
    }

    /// Products with a non-zero net total, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, i64)> {
        self.sold
            .iter()
            .map(|(id, units)| (id, whole_units(*units)))
            .filter(|(_, units)| *units != 0)
    }

    /// `true` when no product has a non-zero net total.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

// `as` saturates at the i64 bounds.
fn whole_units(total: f64) -> i64 {
    total.trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_sales::SaleLine;

    fn pid(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn sale(items: &[(&str, f64)]) -> SaleRecord {
        SaleRecord {
            items: items
                .iter()
                .map(|(id, q)| SaleLine {
                    product_id: pid(id),
                    quantity: *q,
                })
                .collect(),
        }
    }

    #[test]
    fn same_product_across_records_is_summed() {
        let adj = StockAdjustments::from_sales(vec![sale(&[("P-002", 3.0)]), sale(&[("P-002", 4.0)])]);
        assert_eq!(adj.sold(&pid("P-002")), 7);
        assert_eq!(adj.iter().count(), 1);
    }

    #[test]
    fn zero_quantities_do_not_count_as_adjustments() {
        let adj = StockAdjustments::from_sales(vec![sale(&[("P-001", 0.0)])]);
        assert!(adj.is_empty());
        assert_eq!(adj.sold(&pid("P-001")), 0);
    }

    #[test]
    fn corrections_offset_earlier_sales() {
        let adj = StockAdjustments::from_sales(vec![sale(&[("P-001", 5.0)]), sale(&[("P-001", -3.0)])]);
        assert_eq!(adj.sold(&pid("P-001")), 2);

        let net_return = StockAdjustments::from_sales(vec![sale(&[("P-001", 1.0), ("P-001", -4.0)])]);
        assert_eq!(net_return.sold(&pid("P-001")), -3);
    }

    #[test]
    fn fractions_are_truncated_after_summing() {
        let adj = StockAdjustments::from_sales(vec![sale(&[("P-001", 2.5)]), sale(&[("P-001", 2.5)])]);
        assert_eq!(adj.sold(&pid("P-001")), 5);

        let below_one = StockAdjustments::from_sales(vec![sale(&[("P-002", 0.4), ("P-002", 0.4)])]);
        assert!(below_one.is_empty());
    }

    #[test]
    fn huge_totals_saturate_and_non_finite_units_are_ignored() {
        let mut adj = StockAdjustments::new();
        adj.add(pid("P-001"), 1.0e300);
        adj.add(pid("P-001"), f64::NAN);
        assert_eq!(adj.sold(&pid("P-001")), i64::MAX);
    }
}
