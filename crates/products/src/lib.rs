//! Products domain module.
//!
//! Product records, their create/update rules and the persisted wire format.
//! Pure domain logic: reading and writing the product list is done by the
//! infra layer.

pub mod product;

pub use product::{NewProduct, Product, UpdateProduct, default_catalog, ensure_unique_ids, stored_quantity};
