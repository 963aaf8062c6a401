//! Order lifecycle types
//!
//! - Status and its transition graph
//! - Order / order item shapes and the create request
//! - Events published after each committed lifecycle operation

pub mod event;
pub mod snapshot;
pub mod types;

// Re-exports
pub use event::{EventPayload, OrderEvent, OrderEventType};
pub use snapshot::{Order, OrderItem};
pub use types::*;
