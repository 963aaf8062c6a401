use super::*;
use crate::orders::storage::RedbBackend;
use crate::orders::store::StoreError;
use crate::orders::testing::{Fault, FaultyBackend};
use shared::models::{DiningTable, Dish, Ingredient, RecipeLine};
use shared::order::OrderLineInput;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

mod test_boundary;

// ========================================================================
// Catalog fixture
// ========================================================================
//
// ingredients: 1 Flour 5kg (min 1), 2 Tomato 10kg (min 2)
// dishes:      1 Pizza 8.50    = 2 flour + 1 tomato
//              2 Focaccia 4.00 = 1 flour
//              3 Water 1.50    = (no recipe)
//              4 Old special   inactive
// tables:      1..=3, all free

const FLOUR: i64 = 1;
const TOMATO: i64 = 2;
const PIZZA: i64 = 1;
const FOCACCIA: i64 = 2;
const WATER: i64 = 3;
const OLD_SPECIAL: i64 = 4;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ingredient(id: i64, name: &str, quantity: &str, min: &str) -> Ingredient {
    Ingredient {
        id,
        name: name.to_string(),
        unit: "kg".to_string(),
        quantity: dec(quantity),
        min_quantity: dec(min),
    }
}

fn dish(id: i64, name: &str, price: &str, is_active: bool) -> Dish {
    Dish {
        id,
        category_id: 1,
        name: name.to_string(),
        description: None,
        price: dec(price),
        is_active,
    }
}

fn recipe(dish_id: i64, ingredient_id: i64, qty: &str) -> RecipeLine {
    RecipeLine {
        dish_id,
        ingredient_id,
        qty_per_unit: dec(qty),
    }
}

fn seed_catalog(backend: &RedbBackend) {
    let mut txn = backend.begin().unwrap();
    txn.put_ingredient(&ingredient(FLOUR, "Flour", "5", "1")).unwrap();
    txn.put_ingredient(&ingredient(TOMATO, "Tomato", "10", "2")).unwrap();

    txn.put_dish(&dish(PIZZA, "Pizza", "8.50", true)).unwrap();
    txn.put_dish(&dish(FOCACCIA, "Focaccia", "4.00", true)).unwrap();
    txn.put_dish(&dish(WATER, "Water", "1.50", true)).unwrap();
    txn.put_dish(&dish(OLD_SPECIAL, "Old special", "9.00", false)).unwrap();

    txn.put_recipe_line(&recipe(PIZZA, FLOUR, "2")).unwrap();
    txn.put_recipe_line(&recipe(PIZZA, TOMATO, "1")).unwrap();
    txn.put_recipe_line(&recipe(FOCACCIA, FLOUR, "1")).unwrap();

    for id in 1..=3 {
        txn.put_table(&DiningTable {
            id,
            name: format!("T{}", id),
            status: TableStatus::Free,
        })
        .unwrap();
    }
    txn.commit().unwrap();
}

fn seeded_backend() -> RedbBackend {
    let backend = RedbBackend::open_in_memory().unwrap();
    seed_catalog(&backend);
    backend
}

fn create_test_manager() -> OrdersManager<RedbBackend> {
    OrdersManager::new(seeded_backend())
}

fn ctx() -> OpContext {
    OpContext::background()
}

fn line(dish_id: i64, qty: i32) -> OrderLineInput {
    OrderLineInput {
        dish_id,
        qty,
        notes: None,
    }
}

fn order_input(table_id: i64, items: Vec<OrderLineInput>) -> CreateOrderInput {
    CreateOrderInput {
        table_id,
        waiter_id: 7,
        notes: None,
        items,
    }
}

fn stock<B: OrderBackend>(manager: &OrdersManager<B>, ingredient_id: i64) -> Decimal {
    manager
        .backend()
        .begin_read()
        .unwrap()
        .get_ingredient(ingredient_id)
        .unwrap()
        .unwrap()
        .quantity
}

fn table_status<B: OrderBackend>(manager: &OrdersManager<B>, table_id: i64) -> TableStatus {
    manager
        .backend()
        .begin_read()
        .unwrap()
        .get_table(table_id)
        .unwrap()
        .unwrap()
        .status
}

fn order_count<B: OrderBackend>(manager: &OrdersManager<B>) -> usize {
    manager.list_orders(&ctx(), None).unwrap().len()
}

/// Drive an order to `ready`
fn advance_to_ready<B: OrderBackend>(manager: &OrdersManager<B>, order_id: i64) {
    manager
        .update_status(&ctx(), order_id, OrderStatus::InProgress)
        .unwrap();
    manager
        .update_status(&ctx(), order_id, OrderStatus::Ready)
        .unwrap();
}
