//! Dish Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dish entity (菜品)
///
/// `price` is read once when an order line is created and copied into the
/// order item; later price changes never touch existing orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
}

/// One recipe line: how much of an ingredient a single unit of a dish consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub dish_id: i64,
    pub ingredient_id: i64,
    pub qty_per_unit: Decimal,
}
