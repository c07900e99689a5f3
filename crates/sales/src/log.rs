//! The persisted sales log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::line_item::{LineItem, SaleLine, decode_line_item};

/// One sale as seen by inventory: the usable line items only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleRecord {
    pub items: Vec<SaleLine>,
}

impl SaleRecord {
    /// Decode a raw record. Anything without an `items` array yields an empty
    /// record; it still occupies a slot in the log.
    pub fn decode(raw: &JsonValue) -> Self {
        let items = raw
            .get("items")
            .and_then(JsonValue::as_array)
            .map(|items| items.iter().filter_map(decode_line_item).collect())
            .unwrap_or_default();
        Self { items }
    }
}

/// A sale to append to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub items: Vec<LineItem>,
    #[serde(rename = "fecha")]
    pub recorded_at: DateTime<Utc>,
}

impl NewSale {
    pub fn new(items: Vec<LineItem>) -> Self {
        Self {
            items,
            recorded_at: Utc::now(),
        }
    }
}

/// The sales log, kept as raw JSON entries.
///
/// Entries are never rewritten: appending re-encodes existing entries exactly
/// as they were decoded, including fields this crate does not know about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesLog {
    entries: Vec<JsonValue>,
}

impl SalesLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the stored log.
    ///
    /// Returns `None` when the value is absent, not valid JSON, or not an
    /// array. Callers treat that as "nothing to do".
    pub fn decode(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        match serde_json::from_str::<JsonValue>(raw).ok()? {
            JsonValue::Array(entries) => Some(Self { entries }),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        JsonValue::Array(self.entries.clone()).to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records at positions `>= cursor`, decoded.
    ///
    /// A cursor past the end yields nothing.
    pub fn records_since(&self, cursor: usize) -> impl Iterator<Item = SaleRecord> + '_ {
        self.entries.iter().skip(cursor).map(SaleRecord::decode)
    }

    /// Append a sale. Returns the new length of the log.
    pub fn append(&mut self, sale: &NewSale) -> serde_json::Result<usize> {
        self.entries.push(serde_json::to_value(sale)?);
        Ok(self.entries.len())
    }
}
