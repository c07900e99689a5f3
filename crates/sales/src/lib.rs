//! Sales domain module.
//!
//! The sales log is an append-only JSON array written by the point of sale.
//! This crate decodes it leniently (the writer is not under our control) and
//! appends new sales without disturbing fields it does not understand.

pub mod line_item;
pub mod log;

pub use line_item::{LineItem, SaleLine, decode_line_item, lenient_quantity};
pub use log::{NewSale, SaleRecord, SalesLog};
