//! Line items: one product reference plus a quantity sold.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use bodega_core::ProductId;

/// A line item of a sale being recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    #[serde(rename = "cantidad")]
    pub quantity: u64,
}

/// A line item as read back from the log.
///
/// The quantity is kept as logged: signed (correction entries) and possibly
/// fractional. Truncation happens on per-product totals, not per line.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub quantity: f64,
}

impl From<LineItem> for SaleLine {
    fn from(item: LineItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity as f64,
        }
    }
}

/// Decode one raw line item.
///
/// Returns `None` when the entry cannot reference a product: not an object,
/// or an `id` that is missing, `null`, `false`, empty, zero or otherwise not a
/// valid product id. Numeric ids are accepted and stringified; string ids are
/// trimmed, matching how product rows are read.
pub fn decode_line_item(raw: &JsonValue) -> Option<SaleLine> {
    let obj = raw.as_object()?;
    let id = match obj.get("id")? {
        JsonValue::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        JsonValue::Number(n) => number_to_id(n)?,
        _ => return None,
    };
    let product_id = ProductId::parse(id).ok()?;
    let quantity = obj.get("cantidad").map(lenient_quantity).unwrap_or(0.0);
    Some(SaleLine { product_id, quantity })
}

fn number_to_id(n: &serde_json::Number) -> Option<String> {
    if let Some(i) = n.as_i64() {
        return (i != 0).then(|| i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return (u != 0).then(|| u.to_string());
    }
    let f = n.as_f64()?;
    if f == 0.0 || !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(format!("{}", f as i64))
    } else {
        Some(f.to_string())
    }
}

/// Interpret a raw quantity.
///
/// Numbers and numeric strings count as-is, sign and fraction included, so a
/// negative correction entry offsets earlier sales. Anything else, including
/// non-finite values, is 0.
pub fn lenient_quantity(raw: &JsonValue) -> f64 {
    let value = match raw {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => {
            let s = s.trim();
            if s.is_empty() { None } else { s.parse::<f64>().ok() }
        }
        _ => None,
    };
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
