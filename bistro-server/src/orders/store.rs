//! Collaborator contracts for the lifecycle engine
//!
//! The engine never talks to a database directly. It asks an [`OrderBackend`]
//! for a transaction and drives the leaf collaborators through it:
//!
//! | Trait | Owns |
//! |-------|------|
//! | [`StockLedger`] | ingredient quantities |
//! | [`RecipeCatalog`] | dishes and their recipe lines (read-only) |
//! | [`TableRegistry`] | table occupancy |
//! | [`OrderStore`] | order headers, items and consumption records |
//! | [`SupplyLog`] | restock deliveries |
//!
//! Each collaborator is split into a read half (`*View`, plus the read-only
//! [`RecipeCatalog`]) and a write half extending it. Queries run on a
//! [`StoreView`] snapshot from [`OrderBackend::begin_read`]; commands run on a
//! [`StoreTxn`].
//!
//! All reads and writes made through one [`StoreTxn`] become visible together on
//! [`StoreTxn::commit`]. Dropping the transaction without committing discards
//! every write made through it.

use rust_decimal::Decimal;
use shared::models::{DiningTable, Dish, Ingredient, RecipeLine, Supply, SupplyCreate, TableStatus};
use shared::order::{Order, OrderItem, OrderStatus, StockRequirement};
use thiserror::Error;

/// Backend failure seen by the engine
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A write referenced a row that does not exist
    #[error("{entity} not found: {id}")]
    Missing { entity: &'static str, id: i64 },

    /// Transient conflict, the whole transaction may be retried
    #[error("Transaction conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }

    /// 只有冲突可以重试，其余错误直接上抛
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Order header as handed to [`OrderStore::insert_order`]
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub waiter_id: i64,
    pub table_id: i64,
    pub total: Decimal,
    pub notes: Option<String>,
}

/// Order line as handed to [`OrderStore::append_item`]
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub dish_id: i64,
    pub qty: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

pub trait StockView {
    fn get_ingredient(&self, id: i64) -> StoreResult<Option<Ingredient>>;

    fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>>;
}

pub trait StockLedger: StockView {
    /// Add `delta` (may be negative) to the ingredient's quantity.
    ///
    /// No floor is enforced here; callers check sufficiency first.
    fn apply_delta(&mut self, id: i64, delta: Decimal) -> StoreResult<Ingredient>;
}

pub trait RecipeCatalog {
    fn get_dish(&self, id: i64) -> StoreResult<Option<Dish>>;

    fn get_recipe(&self, dish_id: i64) -> StoreResult<Vec<RecipeLine>>;
}

pub trait TableView {
    fn get_table(&self, id: i64) -> StoreResult<Option<DiningTable>>;
}

pub trait TableRegistry: TableView {
    fn set_table_status(&mut self, id: i64, status: TableStatus) -> StoreResult<()>;
}

pub trait OrderView {
    /// Header only, `items` is left empty
    fn get_order(&self, id: i64) -> StoreResult<Option<Order>>;

    /// Headers ordered by id
    fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>>;

    /// Items ordered by id
    fn items_for_order(&self, order_id: i64) -> StoreResult<Vec<OrderItem>>;
}

pub trait OrderStore: OrderView {
    /// Persist a header with status `new`, assigning id and timestamps
    fn insert_order(&mut self, order: NewOrder) -> StoreResult<Order>;

    fn append_item(&mut self, item: NewOrderItem) -> StoreResult<OrderItem>;

    /// Set status and bump `updated_at`
    fn set_order_status(&mut self, order_id: i64, status: OrderStatus) -> StoreResult<Order>;

    /// Remove the header together with its items
    fn remove_order(&mut self, order_id: i64) -> StoreResult<()>;

    fn record_consumption(
        &mut self,
        order_id: i64,
        consumed: &[StockRequirement],
    ) -> StoreResult<()>;

    /// Remove and return the consumption recorded for the order
    fn take_consumption(&mut self, order_id: i64) -> StoreResult<Vec<StockRequirement>>;
}

pub trait SupplyView {
    /// Deliveries newest first, optionally for one ingredient only
    fn list_supplies(&self, ingredient_id: Option<i64>) -> StoreResult<Vec<Supply>>;
}

pub trait SupplyLog: SupplyView {
    fn insert_supply(&mut self, supply: SupplyCreate) -> StoreResult<Supply>;
}

/// Read halves of every collaborator, as seen by one snapshot
pub trait StoreView: StockView + RecipeCatalog + TableView + OrderView + SupplyView {}

impl<T> StoreView for T where T: StockView + RecipeCatalog + TableView + OrderView + SupplyView {}

/// One atomic unit of work across every collaborator
pub trait StoreTxn: StoreView + StockLedger + TableRegistry + OrderStore + SupplyLog {
    fn commit(self) -> StoreResult<()>;
}

/// Factory for transactions, injected into the engine at construction
pub trait OrderBackend: Send + Sync + 'static {
    type Txn: StoreTxn;
    type ReadTxn: StoreView;

    fn begin(&self) -> StoreResult<Self::Txn>;

    /// 只读快照，不等待正在进行的写事务
    fn begin_read(&self) -> StoreResult<Self::ReadTxn>;
}

impl<B: OrderBackend> OrderBackend for std::sync::Arc<B> {
    type Txn = B::Txn;
    type ReadTxn = B::ReadTxn;

    fn begin(&self) -> StoreResult<Self::Txn> {
        (**self).begin()
    }

    fn begin_read(&self) -> StoreResult<Self::ReadTxn> {
        (**self).begin_read()
    }
}
