//! Order lifecycle module
//!
//! - **store**: collaborator traits (stock ledger, recipe catalog, table registry,
//!   order store, supply log) and the transactional backend contract
//! - **storage**: redb implementation of every collaborator
//! - **manager**: [`OrdersManager`], the lifecycle engine
//! - **context**: per-operation cancellation and deadline
//! - **txn**: write-transaction runner with conflict retries, snapshot reads
//!
//! # Architecture
//!
//! ```text
//! HTTP handler ─► OrdersManager ─► OrderBackend::begin() ─► StoreTxn
//!                      │         │                             │
//!                      │         │                    commit / drop (rollback)
//!                      │         └─► OrderBackend::begin_read() ─► StoreView (queries)
//!                      ▼
//!               broadcast OrderEvent ─► subscribers (event logger, ...)
//! ```

pub mod context;
pub mod manager;
pub mod storage;
pub mod store;
pub mod txn;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use context::{Interrupted, OpContext};
pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use storage::{RedbBackend, RedbReadTxn, RedbTxn};
pub use store::{
    NewOrder, NewOrderItem, OrderBackend, OrderStore, OrderView, RecipeCatalog, StockLedger,
    StockView, StoreError, StoreResult, StoreTxn, StoreView, SupplyLog, SupplyView,
    TableRegistry, TableView,
};
pub use txn::TxnError;

// Re-export shared types for convenience
pub use shared::order::{
    CreateOrderInput, EventPayload, Order, OrderEvent, OrderEventType, OrderItem,
    OrderLineInput, OrderStatus, StockRequirement,
};
