//! Fault-injecting backend for engine and service tests

use super::storage::{RedbBackend, RedbReadTxn, RedbTxn};
use super::store::{
    NewOrder, NewOrderItem, OrderBackend, OrderStore, OrderView, RecipeCatalog, StockLedger,
    StockView, StoreError, StoreResult, StoreTxn, SupplyLog, SupplyView, TableRegistry, TableView,
};
use rust_decimal::Decimal;
use shared::models::{DiningTable, Dish, Ingredient, RecipeLine, Supply, SupplyCreate, TableStatus};
use shared::order::{Order, OrderItem, OrderStatus, StockRequirement};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;

/// Where the wrapped transaction misbehaves
#[derive(Clone, Default)]
pub(crate) enum Fault {
    #[default]
    None,
    /// Fail the n-th (0-based) stock delta
    ApplyDelta(usize),
    AppendItem,
    SetTableStatus,
    RecordConsumption,
    /// Cancel the token while the transaction is writing (client went away)
    CancelOnSetTable(CancellationToken),
}

/// Wraps the redb backend, injecting faults and commit conflicts
///
/// Snapshot reads pass straight through to redb.
#[derive(Clone)]
pub(crate) struct FaultyBackend {
    inner: RedbBackend,
    fault: Fault,
    /// Remaining commits that report a transient conflict
    pub(crate) conflicts: Arc<AtomicU32>,
    /// Write transactions begun so far
    attempts: Arc<AtomicU32>,
}

impl FaultyBackend {
    pub(crate) fn new(inner: RedbBackend, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            conflicts: Arc::new(AtomicU32::new(0)),
            attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub(crate) fn with_conflicts(inner: RedbBackend, conflicts: u32) -> Self {
        let backend = Self::new(inner, Fault::None);
        backend.conflicts.store(conflicts, Ordering::SeqCst);
        backend
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

pub(crate) struct FaultyTxn {
    inner: RedbTxn,
    fault: Fault,
    conflicts: Arc<AtomicU32>,
    deltas: usize,
}

fn injected() -> StoreError {
    StoreError::backend(std::io::Error::other("injected failure"))
}

impl OrderBackend for FaultyBackend {
    type Txn = FaultyTxn;
    type ReadTxn = RedbReadTxn;

    fn begin(&self) -> StoreResult<FaultyTxn> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(FaultyTxn {
            inner: self.inner.begin()?,
            fault: self.fault.clone(),
            conflicts: self.conflicts.clone(),
            deltas: 0,
        })
    }

    fn begin_read(&self) -> StoreResult<RedbReadTxn> {
        self.inner.begin_read()
    }
}

impl StockView for FaultyTxn {
    fn get_ingredient(&self, id: i64) -> StoreResult<Option<Ingredient>> {
        self.inner.get_ingredient(id)
    }

    fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>> {
        self.inner.list_ingredients()
    }
}

impl StockLedger for FaultyTxn {
    fn apply_delta(&mut self, id: i64, delta: Decimal) -> StoreResult<Ingredient> {
        let n = self.deltas;
        self.deltas += 1;
        if matches!(self.fault, Fault::ApplyDelta(at) if at == n) {
            return Err(injected());
        }
        self.inner.apply_delta(id, delta)
    }
}

impl RecipeCatalog for FaultyTxn {
    fn get_dish(&self, id: i64) -> StoreResult<Option<Dish>> {
        self.inner.get_dish(id)
    }

    fn get_recipe(&self, dish_id: i64) -> StoreResult<Vec<RecipeLine>> {
        self.inner.get_recipe(dish_id)
    }
}

impl TableView for FaultyTxn {
    fn get_table(&self, id: i64) -> StoreResult<Option<DiningTable>> {
        self.inner.get_table(id)
    }
}

impl TableRegistry for FaultyTxn {
    fn set_table_status(&mut self, id: i64, status: TableStatus) -> StoreResult<()> {
        match &self.fault {
            Fault::SetTableStatus => return Err(injected()),
            Fault::CancelOnSetTable(token) => token.cancel(),
            _ => {}
        }
        self.inner.set_table_status(id, status)
    }
}

impl OrderView for FaultyTxn {
    fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
        self.inner.get_order(id)
    }

    fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
        self.inner.list_orders(status)
    }

    fn items_for_order(&self, order_id: i64) -> StoreResult<Vec<OrderItem>> {
        self.inner.items_for_order(order_id)
    }
}

impl OrderStore for FaultyTxn {
    fn insert_order(&mut self, order: NewOrder) -> StoreResult<Order> {
        self.inner.insert_order(order)
    }

    fn append_item(&mut self, item: NewOrderItem) -> StoreResult<OrderItem> {
        if matches!(self.fault, Fault::AppendItem) {
            return Err(injected());
        }
        self.inner.append_item(item)
    }

    fn set_order_status(&mut self, order_id: i64, status: OrderStatus) -> StoreResult<Order> {
        self.inner.set_order_status(order_id, status)
    }

    fn remove_order(&mut self, order_id: i64) -> StoreResult<()> {
        self.inner.remove_order(order_id)
    }

    fn record_consumption(
        &mut self,
        order_id: i64,
        consumed: &[StockRequirement],
    ) -> StoreResult<()> {
        if matches!(self.fault, Fault::RecordConsumption) {
            return Err(injected());
        }
        self.inner.record_consumption(order_id, consumed)
    }

    fn take_consumption(&mut self, order_id: i64) -> StoreResult<Vec<StockRequirement>> {
        self.inner.take_consumption(order_id)
    }
}

impl SupplyView for FaultyTxn {
    fn list_supplies(&self, ingredient_id: Option<i64>) -> StoreResult<Vec<Supply>> {
        self.inner.list_supplies(ingredient_id)
    }
}

impl SupplyLog for FaultyTxn {
    fn insert_supply(&mut self, supply: SupplyCreate) -> StoreResult<Supply> {
        self.inner.insert_supply(supply)
    }
}

impl StoreTxn for FaultyTxn {
    fn commit(self) -> StoreResult<()> {
        let pending = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            // inner is dropped here, aborting its writes
            return Err(StoreError::Conflict("injected conflict".to_string()));
        }
        self.inner.commit()
    }
}
