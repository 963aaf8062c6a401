//! redb-based storage layer for the order lifecycle
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `dishes` | `dish_id` | `Dish` | 菜品目录 |
//! | `recipes` | `(dish_id, ingredient_id)` | `RecipeLine` | 配方：每份用量 |
//! | `ingredients` | `ingredient_id` | `Ingredient` | 库存台账 |
//! | `dining_tables` | `table_id` | `DiningTable` | 桌台占用状态 |
//! | `orders` | `order_id` | `Order` (header only) | 订单头 |
//! | `order_items` | `(order_id, item_id)` | `OrderItem` | 订单明细 |
//! | `consumptions` | `order_id` | `Vec<StockRequirement>` | 下单时扣减的库存 |
//! | `supplies` | `supply_id` | `Supply` | 进货记录 |
//! | `sequences` | name | `i64` | id 计数器 |
//!
//! Values are JSON encoded with serde_json.
//!
//! # Concurrency
//!
//! redb allows a single write transaction at a time. Every engine command
//! runs inside one write transaction, so the stock sufficiency check and the
//! deduction can never interleave with another order's deduction.
//!
//! Queries go through [`RedbReadTxn`] (`begin_read`): an MVCC snapshot of the
//! last commit that neither waits for nor blocks the writer.

use super::store::{
    NewOrder, NewOrderItem, OrderBackend, OrderStore, OrderView, RecipeCatalog, StockLedger,
    StockView, StoreError, StoreResult, StoreTxn, SupplyLog, SupplyView, TableRegistry, TableView,
};
use redb::{Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{DiningTable, Dish, Ingredient, RecipeLine, Supply, SupplyCreate, TableStatus};
use shared::order::{Order, OrderItem, OrderStatus, StockRequirement};
use std::path::Path;
use std::sync::Arc;

/// JSON value keyed by id
type JsonTable = TableDefinition<'static, i64, &'static [u8]>;

/// JSON value keyed by (parent_id, child_id)
type JsonPairTable = TableDefinition<'static, (i64, i64), &'static [u8]>;

const DISHES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("dishes");

/// key = (dish_id, ingredient_id)
const RECIPES_TABLE: TableDefinition<(i64, i64), &[u8]> = TableDefinition::new("recipes");

const INGREDIENTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("ingredients");

const DINING_TABLES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("dining_tables");

const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// key = (order_id, item_id)
const ORDER_ITEMS_TABLE: TableDefinition<(i64, i64), &[u8]> =
    TableDefinition::new("order_items");

const CONSUMPTIONS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("consumptions");

const SUPPLIES_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("supplies");

const SEQUENCE_TABLE: TableDefinition<&str, i64> = TableDefinition::new("sequences");

const ORDER_ID_KEY: &str = "order_id";
const ORDER_ITEM_ID_KEY: &str = "order_item_id";
const SUPPLY_ID_KEY: &str = "supply_id";

macro_rules! impl_backend_error {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for StoreError {
                fn from(err: $err) -> Self {
                    StoreError::backend(err)
                }
            }
        )*
    };
}

impl_backend_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Order backend backed by redb
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend").finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the data survives a power loss.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and demos)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(DISHES_TABLE)?;
            let _ = write_txn.open_table(RECIPES_TABLE)?;
            let _ = write_txn.open_table(INGREDIENTS_TABLE)?;
            let _ = write_txn.open_table(DINING_TABLES_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_ITEMS_TABLE)?;
            let _ = write_txn.open_table(CONSUMPTIONS_TABLE)?;
            let _ = write_txn.open_table(SUPPLIES_TABLE)?;
            let _ = write_txn.open_table(SEQUENCE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl OrderBackend for RedbBackend {
    type Txn = RedbTxn;
    type ReadTxn = RedbReadTxn;

    fn begin(&self) -> StoreResult<RedbTxn> {
        Ok(RedbTxn {
            txn: self.db.begin_write()?,
        })
    }

    fn begin_read(&self) -> StoreResult<RedbReadTxn> {
        Ok(RedbReadTxn {
            txn: self.db.begin_read()?,
        })
    }
}

/// A redb write transaction exposing every collaborator contract
///
/// Dropping it without [`StoreTxn::commit`] aborts all of its writes.
pub struct RedbTxn {
    txn: WriteTransaction,
}

/// A redb read snapshot exposing the read halves of the collaborators
pub struct RedbReadTxn {
    txn: ReadTransaction,
}

/// 读路径：读事务和写事务共用同一份实现
macro_rules! impl_store_views {
    ($($txn:ty),* $(,)?) => {
        $(
            impl $txn {
                fn get_json<T: DeserializeOwned>(
                    &self,
                    def: JsonTable,
                    id: i64,
                ) -> StoreResult<Option<T>> {
                    let table = self.txn.open_table(def)?;
                    match table.get(id)? {
                        Some(value) => Ok(Some(decode(value.value())?)),
                        None => Ok(None),
                    }
                }

                fn all_json<T: DeserializeOwned>(&self, def: JsonTable) -> StoreResult<Vec<T>> {
                    let table = self.txn.open_table(def)?;
                    let mut values = Vec::new();
                    for result in table.iter()? {
                        let (_key, value) = result?;
                        values.push(decode(value.value())?);
                    }
                    Ok(values)
                }

                /// All values whose key starts with `parent`
                fn children_json<T: DeserializeOwned>(
                    &self,
                    def: JsonPairTable,
                    parent: i64,
                ) -> StoreResult<Vec<T>> {
                    let table = self.txn.open_table(def)?;
                    let mut values = Vec::new();
                    for result in table.range((parent, i64::MIN)..=(parent, i64::MAX))? {
                        let (_key, value) = result?;
                        values.push(decode(value.value())?);
                    }
                    Ok(values)
                }
            }

            impl StockView for $txn {
                fn get_ingredient(&self, id: i64) -> StoreResult<Option<Ingredient>> {
                    self.get_json(INGREDIENTS_TABLE, id)
                }

                fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>> {
                    self.all_json(INGREDIENTS_TABLE)
                }
            }

            impl RecipeCatalog for $txn {
                fn get_dish(&self, id: i64) -> StoreResult<Option<Dish>> {
                    self.get_json(DISHES_TABLE, id)
                }

                fn get_recipe(&self, dish_id: i64) -> StoreResult<Vec<RecipeLine>> {
                    self.children_json(RECIPES_TABLE, dish_id)
                }
            }

            impl TableView for $txn {
                fn get_table(&self, id: i64) -> StoreResult<Option<DiningTable>> {
                    self.get_json(DINING_TABLES_TABLE, id)
                }
            }

            impl OrderView for $txn {
                fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
                    self.get_json(ORDERS_TABLE, id)
                }

                fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
                    let orders: Vec<Order> = self.all_json(ORDERS_TABLE)?;
                    Ok(orders
                        .into_iter()
                        .filter(|o| status.is_none_or(|s| o.status == s))
                        .collect())
                }

                fn items_for_order(&self, order_id: i64) -> StoreResult<Vec<OrderItem>> {
                    self.children_json(ORDER_ITEMS_TABLE, order_id)
                }
            }

            impl SupplyView for $txn {
                fn list_supplies(&self, ingredient_id: Option<i64>) -> StoreResult<Vec<Supply>> {
                    let supplies: Vec<Supply> = self.all_json(SUPPLIES_TABLE)?;
                    // ids are assigned in delivery order
                    Ok(supplies
                        .into_iter()
                        .rev()
                        .filter(|s| ingredient_id.is_none_or(|id| s.ingredient_id == id))
                        .collect())
                }
            }
        )*
    };
}

impl_store_views!(RedbTxn, RedbReadTxn);

impl RedbTxn {
    fn next_id(&self, key: &str) -> StoreResult<i64> {
        let mut table = self.txn.open_table(SEQUENCE_TABLE)?;
        let current = table.get(key)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key, next)?;
        Ok(next)
    }

    fn put_json<T: Serialize>(&self, def: JsonTable, id: i64, value: &T) -> StoreResult<()> {
        let mut table = self.txn.open_table(def)?;
        let bytes = encode(value)?;
        table.insert(id, bytes.as_slice())?;
        Ok(())
    }

    // ========== Catalog Maintenance ==========

    /// 目录中是否已有菜品或原料
    pub fn has_catalog(&self) -> StoreResult<bool> {
        let dishes = self.txn.open_table(DISHES_TABLE)?;
        let ingredients = self.txn.open_table(INGREDIENTS_TABLE)?;
        Ok(dishes.iter()?.next().is_some() || ingredients.iter()?.next().is_some())
    }

    /// Insert or replace a dish
    pub fn put_dish(&mut self, dish: &Dish) -> StoreResult<()> {
        self.put_json(DISHES_TABLE, dish.id, dish)
    }

    /// Insert or replace an ingredient (quantity included)
    pub fn put_ingredient(&mut self, ingredient: &Ingredient) -> StoreResult<()> {
        self.put_json(INGREDIENTS_TABLE, ingredient.id, ingredient)
    }

    /// Insert or replace one recipe line
    pub fn put_recipe_line(&mut self, line: &RecipeLine) -> StoreResult<()> {
        let mut table = self.txn.open_table(RECIPES_TABLE)?;
        let bytes = encode(line)?;
        table.insert((line.dish_id, line.ingredient_id), bytes.as_slice())?;
        Ok(())
    }

    /// Insert or replace a dining table
    pub fn put_table(&mut self, table: &DiningTable) -> StoreResult<()> {
        self.put_json(DINING_TABLES_TABLE, table.id, table)
    }
}

impl StockLedger for RedbTxn {
    fn apply_delta(&mut self, id: i64, delta: Decimal) -> StoreResult<Ingredient> {
        let mut ingredient: Ingredient = self
            .get_json(INGREDIENTS_TABLE, id)?
            .ok_or(StoreError::Missing {
                entity: "ingredient",
                id,
            })?;
        ingredient.quantity += delta;
        self.put_json(INGREDIENTS_TABLE, id, &ingredient)?;
        Ok(ingredient)
    }
}

impl TableRegistry for RedbTxn {
    fn set_table_status(&mut self, id: i64, status: TableStatus) -> StoreResult<()> {
        let mut table: DiningTable = self
            .get_json(DINING_TABLES_TABLE, id)?
            .ok_or(StoreError::Missing { entity: "table", id })?;
        table.status = status;
        self.put_json(DINING_TABLES_TABLE, id, &table)
    }
}

impl OrderStore for RedbTxn {
    fn insert_order(&mut self, order: NewOrder) -> StoreResult<Order> {
        let id = self.next_id(ORDER_ID_KEY)?;
        let now = shared::util::now_millis();
        let header = Order {
            id,
            waiter_id: order.waiter_id,
            table_id: order.table_id,
            status: OrderStatus::New,
            total: order.total,
            notes: order.notes,
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        };
        self.put_json(ORDERS_TABLE, id, &header)?;
        Ok(header)
    }

    fn append_item(&mut self, item: NewOrderItem) -> StoreResult<OrderItem> {
        if self.get_order(item.order_id)?.is_none() {
            return Err(StoreError::Missing {
                entity: "order",
                id: item.order_id,
            });
        }
        let id = self.next_id(ORDER_ITEM_ID_KEY)?;
        let stored = OrderItem {
            id,
            order_id: item.order_id,
            dish_id: item.dish_id,
            qty: item.qty,
            unit_price: item.unit_price,
            notes: item.notes,
        };
        let mut table = self.txn.open_table(ORDER_ITEMS_TABLE)?;
        let bytes = encode(&stored)?;
        table.insert((stored.order_id, id), bytes.as_slice())?;
        Ok(stored)
    }

    fn set_order_status(&mut self, order_id: i64, status: OrderStatus) -> StoreResult<Order> {
        let mut order: Order = self
            .get_json(ORDERS_TABLE, order_id)?
            .ok_or(StoreError::Missing {
                entity: "order",
                id: order_id,
            })?;
        order.status = status;
        order.updated_at = shared::util::now_millis().max(order.updated_at);
        self.put_json(ORDERS_TABLE, order_id, &order)?;
        Ok(order)
    }

    fn remove_order(&mut self, order_id: i64) -> StoreResult<()> {
        {
            let mut orders = self.txn.open_table(ORDERS_TABLE)?;
            if orders.remove(order_id)?.is_none() {
                return Err(StoreError::Missing {
                    entity: "order",
                    id: order_id,
                });
            }
        }

        let mut items = self.txn.open_table(ORDER_ITEMS_TABLE)?;
        let mut keys = Vec::new();
        for result in items.range((order_id, i64::MIN)..=(order_id, i64::MAX))? {
            let (key, _value) = result?;
            keys.push(key.value());
        }
        for key in keys {
            items.remove(key)?;
        }

        let mut consumptions = self.txn.open_table(CONSUMPTIONS_TABLE)?;
        consumptions.remove(order_id)?;
        Ok(())
    }

    fn record_consumption(
        &mut self,
        order_id: i64,
        consumed: &[StockRequirement],
    ) -> StoreResult<()> {
        self.put_json(CONSUMPTIONS_TABLE, order_id, &consumed)
    }

    fn take_consumption(&mut self, order_id: i64) -> StoreResult<Vec<StockRequirement>> {
        let mut table = self.txn.open_table(CONSUMPTIONS_TABLE)?;
        let removed = table.remove(order_id)?;
        match removed {
            Some(value) => decode(value.value()),
            None => Ok(Vec::new()),
        }
    }
}

impl SupplyLog for RedbTxn {
    fn insert_supply(&mut self, supply: SupplyCreate) -> StoreResult<Supply> {
        let id = self.next_id(SUPPLY_ID_KEY)?;
        let stored = Supply {
            id,
            ingredient_id: supply.ingredient_id,
            quantity: supply.quantity,
            supplier_name: supply.supplier_name,
            created_at: shared::util::now_millis(),
        };
        self.put_json(SUPPLIES_TABLE, id, &stored)?;
        Ok(stored)
    }
}

impl StoreTxn for RedbTxn {
    fn commit(self) -> StoreResult<()> {
        self.txn.commit()?;
        Ok(())
    }
}
