//! Storage change notifications.
//!
//! Every write to the key-value store is announced as a [`StorageEvent`] so
//! that independent views (or background workers) can react to data that
//! another writer changed.

pub mod bus;
pub mod in_memory_bus;
pub mod storage_event;

pub use bus::{ChangeBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryChangeBus};
pub use storage_event::{KeyScoped, StorageEvent};
