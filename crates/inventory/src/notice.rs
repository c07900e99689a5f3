use serde::Serialize;

use bodega_core::ProductId;

/// Advisory message for a product whose stock was moved by sales.
///
/// Informational only; nothing depends on notices being delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockNotice {
    pub product_id: ProductId,
    pub name: String,
    /// Net units sold; negative for net returns.
    pub sold: i64,
}

impl core::fmt::Display for StockNotice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.sold < 0 {
            write!(f, "{}: +{} units from sales", self.name, self.sold.unsigned_abs())
        } else {
            write!(f, "{}: -{} units from sales", self.name, self.sold)
        }
    }
}
