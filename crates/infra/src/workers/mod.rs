//! Background workers.

pub mod key_watcher;

pub use key_watcher::{KeyWatcher, WorkerHandle};
