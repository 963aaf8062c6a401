//! Order record as persisted and returned to callers

use super::types::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order header plus its line items
///
/// Created only by the lifecycle engine. `total` is always computed by the
/// server from dish prices at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub waiter_id: i64,
    pub table_id: i64,
    pub status: OrderStatus,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Loaded separately from the header; empty when only the header was read
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// One order line with its price snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub dish_id: i64,
    pub qty: i32,
    /// Dish price copied at creation
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.qty)
    }
}
