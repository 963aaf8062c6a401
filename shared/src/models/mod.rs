//! Data models
//!
//! Shared between bistro-server and API clients.
//! All IDs are `i64`; money and stock quantities are [`rust_decimal::Decimal`].

pub mod dining_table;
pub mod dish;
pub mod ingredient;
pub mod supply;

// Re-exports
pub use dining_table::*;
pub use dish::*;
pub use ingredient::*;
pub use supply::*;
