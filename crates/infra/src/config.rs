//! Configuration loading and representation.
//!
//! Everything is read from environment variables:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `BODEGA_STORE` | `memory`, `sqlite` or `sqlite:<path>` | `sqlite` under the OS data dir |
//! | `BODEGA_PRODUCTS_KEY` | key of the product list | `productos-listado` |
//! | `BODEGA_SALES_KEY` | key of the sales log | `ventas-listado` |
//! | `BODEGA_CURSOR_KEY` | key of the reconciliation cursor | `ventas-aplicadas-count` |
//! | `BODEGA_WATCH` | keep reconciling on sales-log changes | `false` |

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_PRODUCTS_KEY: &str = "productos-listado";
pub const DEFAULT_SALES_KEY: &str = "ventas-listado";
pub const DEFAULT_CURSOR_KEY: &str = "ventas-aplicadas-count";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid BODEGA_STORE value {0:?} (expected `memory`, `sqlite` or `sqlite:<path>`)")]
    InvalidStore(String),

    #[error("{0} cannot be empty")]
    EmptyKey(&'static str),

    #[error("storage keys must be distinct ({0:?} is used twice)")]
    DuplicateKey(String),

    #[error("invalid boolean for {var}: {value:?}")]
    InvalidBool { var: &'static str, value: String },

    #[error("could not determine a data directory for the default store; set BODEGA_STORE")]
    NoDataDir,
}

/// Which backend persists the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite(PathBuf),
}

/// Storage keys used by inventory reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub products: String,
    pub sales: String,
    pub cursor: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            products: DEFAULT_PRODUCTS_KEY.to_string(),
            sales: DEFAULT_SALES_KEY.to_string(),
            cursor: DEFAULT_CURSOR_KEY.to_string(),
        }
    }
}

impl StorageKeys {
    fn validate(&self) -> Result<(), ConfigError> {
        for (var, value) in [
            ("BODEGA_PRODUCTS_KEY", &self.products),
            ("BODEGA_SALES_KEY", &self.sales),
            ("BODEGA_CURSOR_KEY", &self.cursor),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyKey(var));
            }
        }
        if self.products == self.sales || self.products == self.cursor {
            return Err(ConfigError::DuplicateKey(self.products.clone()));
        }
        if self.sales == self.cursor {
            return Err(ConfigError::DuplicateKey(self.sales.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodegaConfig {
    pub store: StoreBackend,
    pub keys: StorageKeys,
    pub watch: bool,
}

impl BodegaConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup (tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("BODEGA_STORE") {
            Some(raw) => parse_store(&raw)?,
            None => StoreBackend::Sqlite(default_store_path()?),
        };

        let defaults = StorageKeys::default();
        let keys = StorageKeys {
            products: lookup("BODEGA_PRODUCTS_KEY").unwrap_or(defaults.products),
            sales: lookup("BODEGA_SALES_KEY").unwrap_or(defaults.sales),
            cursor: lookup("BODEGA_CURSOR_KEY").unwrap_or(defaults.cursor),
        };
        keys.validate()?;

        let watch = match lookup("BODEGA_WATCH") {
            Some(raw) => parse_bool("BODEGA_WATCH", &raw)?,
            None => false,
        };

        Ok(Self { store, keys, watch })
    }
}

fn parse_store(raw: &str) -> Result<StoreBackend, ConfigError> {
    let raw = raw.trim();
    match raw {
        "memory" => Ok(StoreBackend::Memory),
        "sqlite" => Ok(StoreBackend::Sqlite(default_store_path()?)),
        _ => match raw.strip_prefix("sqlite:") {
            Some(path) if !path.trim().is_empty() => Ok(StoreBackend::Sqlite(PathBuf::from(path.trim()))),
            _ => Err(ConfigError::InvalidStore(raw.to_string())),
        },
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: raw.to_string(),
        }),
    }
}

/// `{data_dir}/bodega/store.db`.
fn default_store_path() -> Result<PathBuf, ConfigError> {
    let mut dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    dir.push("bodega");
    dir.push("store.db");
    Ok(dir)
}
