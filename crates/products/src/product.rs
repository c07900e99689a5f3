use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use bodega_core::{DomainError, DomainResult, Entity, ProductId, RowKey, first_duplicate_id};

/// A product held in stock.
///
/// Persisted as `{ "key", "id", "nombre", "cantidad", "precio"? }`. Rows written
/// by earlier versions of the app load as they are: padded ids are trimmed and
/// `cantidad` is read leniently (see [`stored_quantity`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredProduct", into = "ProductRecord")]
pub struct Product {
    row_key: RowKey,
    id: ProductId,
    name: String,
    quantity: u64,
    price: Option<f64>,
}

/// On-disk shape of a product, as written.
#[derive(Debug, Clone, Serialize)]
struct ProductRecord {
    key: String,
    id: ProductId,
    #[serde(rename = "nombre")]
    name: String,
    #[serde(rename = "cantidad")]
    quantity: u64,
    #[serde(rename = "precio", skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
}

/// On-disk shape of a product, as read.
#[derive(Debug, Deserialize)]
struct StoredProduct {
    #[serde(default)]
    key: Option<String>,
    id: String,
    #[serde(rename = "nombre")]
    name: String,
    #[serde(rename = "cantidad", default)]
    quantity: JsonValue,
    #[serde(rename = "precio", default)]
    price: Option<f64>,
}

impl TryFrom<StoredProduct> for Product {
    type Error = DomainError;

    fn try_from(r: StoredProduct) -> Result<Self, Self::Error> {
        let id = ProductId::parse(r.id.trim())?;
        // Rows without a key fall back to the business id, which is unique.
        let row_key = r
            .key
            .map(RowKey::from_string)
            .unwrap_or_else(|| RowKey::from_string(id.as_str()));
        Ok(Self {
            row_key,
            id,
            name: r.name,
            quantity: stored_quantity(&r.quantity),
            price: r.price,
        })
    }
}

/// Interpret a stored `cantidad`.
///
/// Numbers and numeric strings are truncated toward zero; negative, missing
/// or non-numeric values read as 0.
pub fn stored_quantity(raw: &JsonValue) -> u64 {
    let value = match raw {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.trunc() as u64,
        _ => 0,
    }
}

impl From<Product> for ProductRecord {
    fn from(p: Product) -> Self {
        Self {
            key: p.row_key.as_str().to_string(),
            id: p.id,
            name: p.name,
            quantity: p.quantity,
            price: p.price,
        }
    }
}

impl Product {
    pub fn row_key(&self) -> &RowKey {
        &self.row_key
    }

    pub fn product_id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    /// Overwrite the on-hand quantity (manual count or reconciliation).
    pub fn set_quantity(&mut self, quantity: u64) {
        self.quantity = quantity;
    }

    /// Build a new product from a validated command.
    ///
    /// `existing` is the current list; ids must stay unique within it.
    pub fn create(cmd: &NewProduct, existing: &[Product]) -> DomainResult<Self> {
        cmd.validate()?;
        if existing.iter().any(|p| p.id == cmd.id) {
            return Err(DomainError::conflict(format!(
                "product id {} already exists",
                cmd.id
            )));
        }
        Ok(Self {
            row_key: RowKey::generate(),
            id: cmd.id.clone(),
            name: cmd.name.trim().to_string(),
            quantity: cmd.quantity,
            price: cmd.price,
        })
    }

    /// Apply an edit. The product id is immutable.
    pub fn apply_update(&mut self, cmd: &UpdateProduct) -> DomainResult<()> {
        cmd.validate()?;
        self.name = cmd.name.trim().to_string();
        self.quantity = cmd.quantity;
        self.price = cmd.price;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: register a new product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub quantity: u64,
    pub price: Option<f64>,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

/// Command: edit an existing product.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateProduct {
    pub name: String,
    pub quantity: u64,
    pub price: Option<f64>,
}

impl UpdateProduct {
    pub fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

fn validate_price(price: Option<f64>) -> DomainResult<()> {
    match price {
        Some(p) if !p.is_finite() => Err(DomainError::validation("price must be a finite number")),
        Some(p) if p < 0.0 => Err(DomainError::validation("price cannot be negative")),
        _ => Ok(()),
    }
}

/// Check that no two products share an id.
///
/// Lists loaded from storage may have been written by other tools; callers use
/// this before trusting id-based lookups.
pub fn ensure_unique_ids(products: &[Product]) -> DomainResult<()> {
    match first_duplicate_id(products) {
        Some(id) => Err(DomainError::invariant(format!("duplicate product id {id}"))),
        None => Ok(()),
    }
}

/// Catalog used when no product list has been stored yet.
pub fn default_catalog() -> Vec<Product> {
    let seed = [
        ("1", "P-001", "Fideo Tallarín", 500, 120.0),
        ("2", "P-002", "Ravioles", 300, 250.0),
    ];
    seed.into_iter()
        .filter_map(|(key, id, name, quantity, price)| {
            Some(Product {
                row_key: RowKey::from_string(key),
                id: ProductId::parse(id).ok()?,
                name: name.to_string(),
                quantity,
                price: Some(price),
            })
        })
        .collect()
}
