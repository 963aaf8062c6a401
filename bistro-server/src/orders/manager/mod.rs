//! OrdersManager - order lifecycle and inventory consumption
//!
//! This module handles:
//! - Order creation with server-side pricing and stock deduction
//! - Status transitions along `new → in_progress → ready → paid`
//! - Closing (payment) and deletion of orders
//! - Event broadcasting after each commit
//!
//! # Create Flow
//!
//! ```text
//! create_order(input)
//!     ├─ 1. Validate lines (non-empty, qty > 0)
//!     ├─ 2. Begin transaction, check context
//!     ├─ 3. Resolve table and dishes
//!     ├─ 4. Accumulate ingredient requirements
//!     ├─ 5. Check every requirement against stock (no writes yet)
//!     ├─ 6. Persist header + items with price snapshots
//!     ├─ 7. Deduct stock and record consumption
//!     ├─ 8. Mark table busy
//!     ├─ 9. Check context, commit
//!     └─ 10. Broadcast ORDER_CREATED
//! ```
//!
//! Any error before step 9 drops the transaction, leaving stock, tables and
//! orders exactly as they were.

mod error;
pub use error::*;

use super::context::OpContext;
use super::store::{
    NewOrder, NewOrderItem, OrderBackend, OrderStore, OrderView, RecipeCatalog, StockLedger,
    StockView, StoreTxn, TableRegistry, TableView,
};
use super::txn;
use rust_decimal::Decimal;
use shared::models::TableStatus;
use shared::order::{
    CreateOrderInput, EventPayload, Order, OrderEvent, OrderStatus, StockRequirement,
};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Retries after a transient backend conflict
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Order lifecycle engine
///
/// Generic over the storage backend; every mutating call runs inside exactly
/// one backend transaction.
pub struct OrdersManager<B: OrderBackend> {
    backend: B,
    event_tx: broadcast::Sender<OrderEvent>,
    max_retries: u32,
}

impl<B: OrderBackend> std::fmt::Debug for OrdersManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("backend", &"<OrderBackend>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl<B: OrderBackend> OrdersManager<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_MAX_RETRIES)
    }

    pub fn with_options(backend: B, event_capacity: usize, max_retries: u32) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));
        Self {
            backend,
            event_tx,
            max_retries,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Subscribe to events committed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    // ========== Transaction Plumbing ==========

    fn run_in_txn<T>(
        &self,
        ctx: &OpContext,
        op: impl FnMut(&mut B::Txn) -> ManagerResult<T>,
    ) -> ManagerResult<T> {
        txn::run_in_txn(&self.backend, ctx, self.max_retries, op)
    }

    /// Queries read a snapshot and never wait behind a command
    fn read<T>(
        &self,
        ctx: &OpContext,
        op: impl FnOnce(&B::ReadTxn) -> ManagerResult<T>,
    ) -> ManagerResult<T> {
        txn::read(&self.backend, ctx, op)
    }

    fn broadcast(&self, order_id: i64, payload: EventPayload) {
        // No subscribers is fine
        let _ = self.event_tx.send(OrderEvent::new(order_id, payload));
    }

    // ========== Lifecycle Operations ==========

    /// Create an order: price it, check and deduct stock, occupy the table
    pub fn create_order(&self, ctx: &OpContext, input: CreateOrderInput) -> ManagerResult<Order> {
        validate_lines(&input)?;

        let (order, consumed) = self.run_in_txn(ctx, |txn| create_in_txn(txn, &input))?;

        self.broadcast(
            order.id,
            EventPayload::OrderCreated {
                table_id: order.table_id,
                waiter_id: order.waiter_id,
                total: order.total,
                item_count: order.items.len(),
                consumed,
            },
        );
        Ok(order)
    }

    /// Advance an order one step along the lifecycle.
    ///
    /// Requesting the current status is a no-op. Reaching `paid` frees the table.
    pub fn update_status(
        &self,
        ctx: &OpContext,
        order_id: i64,
        new_status: OrderStatus,
    ) -> ManagerResult<Order> {
        let (order, payload) = self.run_in_txn(ctx, |txn| {
            let current = load_order(txn, order_id)?;
            if current.status == new_status {
                return Ok((with_items(txn, current)?, None));
            }
            if !current.status.can_transition_to(new_status) {
                return Err(ManagerError::InvalidStatusChange {
                    from: current.status,
                    to: new_status,
                });
            }

            let updated = txn.set_order_status(order_id, new_status)?;
            let table_freed = if new_status == OrderStatus::Paid {
                txn.set_table_status(updated.table_id, TableStatus::Free)?;
                Some(updated.table_id)
            } else {
                None
            };

            let payload = EventPayload::StatusChanged {
                from: current.status,
                to: new_status,
                table_freed,
            };
            Ok((with_items(txn, updated)?, Some(payload)))
        })?;

        if let Some(payload) = payload {
            self.broadcast(order.id, payload);
        }
        Ok(order)
    }

    /// Close a `ready` order: mark it paid and free its table
    pub fn close_order(&self, ctx: &OpContext, order_id: i64) -> ManagerResult<Order> {
        let order = self.run_in_txn(ctx, |txn| {
            let current = load_order(txn, order_id)?;
            if current.status != OrderStatus::Ready {
                return Err(ManagerError::OrderNotReady {
                    order_id,
                    status: current.status,
                });
            }

            let updated = txn.set_order_status(order_id, OrderStatus::Paid)?;
            txn.set_table_status(updated.table_id, TableStatus::Free)?;
            with_items(txn, updated)
        })?;

        self.broadcast(
            order.id,
            EventPayload::OrderClosed {
                table_id: order.table_id,
                total: order.total,
            },
        );
        Ok(order)
    }

    /// Delete a `new` order, returning its consumed stock and freeing its table
    pub fn delete_order(&self, ctx: &OpContext, order_id: i64) -> ManagerResult<()> {
        let (table_id, restored) = self.run_in_txn(ctx, |txn| {
            let current = load_order(txn, order_id)?;
            if current.status != OrderStatus::New {
                return Err(ManagerError::OrderNotDeletable {
                    order_id,
                    status: current.status,
                });
            }

            let restored = txn.take_consumption(order_id)?;
            for req in &restored {
                txn.apply_delta(req.ingredient_id, req.quantity)?;
            }
            txn.set_table_status(current.table_id, TableStatus::Free)?;
            txn.remove_order(order_id)?;
            Ok((current.table_id, restored))
        })?;

        self.broadcast(order_id, EventPayload::OrderDeleted { table_id, restored });
        Ok(())
    }

    // ========== Queries ==========

    /// Order with its items
    pub fn get_order(&self, ctx: &OpContext, order_id: i64) -> ManagerResult<Order> {
        self.read(ctx, |txn| {
            let order = load_order(txn, order_id)?;
            with_items(txn, order)
        })
    }

    /// Orders with their items, ordered by id
    pub fn list_orders(
        &self,
        ctx: &OpContext,
        status: Option<OrderStatus>,
    ) -> ManagerResult<Vec<Order>> {
        self.read(ctx, |txn| {
            txn.list_orders(status)?
                .into_iter()
                .map(|order| with_items(txn, order))
                .collect()
        })
    }
}

fn validate_lines(input: &CreateOrderInput) -> ManagerResult<()> {
    if input.items.is_empty() {
        return Err(ManagerError::EmptyOrder);
    }
    if let Some(line) = input.items.iter().find(|line| line.qty <= 0) {
        return Err(ManagerError::Validation(format!(
            "quantity must be positive (dish {}: {})",
            line.dish_id, line.qty
        )));
    }
    Ok(())
}

fn load_order<T: OrderView>(txn: &T, order_id: i64) -> ManagerResult<Order> {
    txn.get_order(order_id)?
        .ok_or(ManagerError::OrderNotFound(order_id))
}

fn with_items<T: OrderView>(txn: &T, mut order: Order) -> ManagerResult<Order> {
    order.items = txn.items_for_order(order.id)?;
    Ok(order)
}

fn create_in_txn<T: StoreTxn>(
    txn: &mut T,
    input: &CreateOrderInput,
) -> ManagerResult<(Order, Vec<StockRequirement>)> {
    let table = txn
        .get_table(input.table_id)?
        .ok_or(ManagerError::TableNotFound(input.table_id))?;

    let mut dishes = Vec::with_capacity(input.items.len());
    for line in &input.items {
        let dish = txn
            .get_dish(line.dish_id)?
            .filter(|dish| dish.is_active)
            .ok_or(ManagerError::DishNotFound(line.dish_id))?;
        dishes.push(dish);
    }

    // 同一原料跨多行累加，整单一起校验
    let mut required: BTreeMap<i64, Decimal> = BTreeMap::new();
    for (line, dish) in input.items.iter().zip(&dishes) {
        for recipe in txn.get_recipe(dish.id)? {
            *required.entry(recipe.ingredient_id).or_default() +=
                recipe.qty_per_unit * Decimal::from(line.qty);
        }
    }
    let requirements: Vec<StockRequirement> = required
        .into_iter()
        .map(|(ingredient_id, quantity)| StockRequirement {
            ingredient_id,
            quantity,
        })
        .collect();

    for req in &requirements {
        let ingredient = txn
            .get_ingredient(req.ingredient_id)?
            .ok_or(ManagerError::IngredientNotFound(req.ingredient_id))?;
        if req.quantity > ingredient.quantity {
            return Err(ManagerError::InsufficientStock {
                ingredient_id: req.ingredient_id,
                required: req.quantity,
                available: ingredient.quantity,
            });
        }
    }

    let total: Decimal = input
        .items
        .iter()
        .zip(&dishes)
        .map(|(line, dish)| dish.price * Decimal::from(line.qty))
        .sum();

    let mut order = txn.insert_order(NewOrder {
        waiter_id: input.waiter_id,
        table_id: table.id,
        total,
        notes: input.notes.clone(),
    })?;

    for (line, dish) in input.items.iter().zip(&dishes) {
        let item = txn.append_item(NewOrderItem {
            order_id: order.id,
            dish_id: dish.id,
            qty: line.qty,
            unit_price: dish.price,
            notes: line.notes.clone(),
        })?;
        order.items.push(item);
    }

    for req in &requirements {
        txn.apply_delta(req.ingredient_id, -req.quantity)?;
    }
    txn.record_consumption(order.id, &requirements)?;

    txn.set_table_status(table.id, TableStatus::Busy)?;

    Ok((order, requirements))
}

#[cfg(test)]
mod tests;
