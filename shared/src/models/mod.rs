//! Data models
//!
//! Status enums shared between the API surface and the storage layer.
//! Database columns store the `as_db()` string form; the wire form is
//! the serde rendering of the same strings.

pub mod order;
pub mod stock;

// Re-exports
pub use order::*;
pub use stock::*;
