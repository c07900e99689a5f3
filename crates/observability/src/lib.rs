//! Process-wide logging setup shared by the bodega binaries.

/// Initialize structured logging with the `info` default level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init("info");
}

/// Subscriber configuration (filters, output format).
pub mod tracing;
