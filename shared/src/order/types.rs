//! Shared types for the order lifecycle

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Order Status
// ============================================================================

/// Order status
///
/// ```text
/// new ──► in_progress ──► ready ──► paid
/// ```
///
/// `paid` is terminal. No state may be skipped and no transition goes back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    InProgress,
    Ready,
    Paid,
}

impl OrderStatus {
    /// All statuses in lifecycle order
    pub const LIFECYCLE: [OrderStatus; 4] = [
        OrderStatus::New,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Paid,
    ];

    /// The only status this one may advance to
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::New => Some(OrderStatus::InProgress),
            OrderStatus::InProgress => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Paid),
            OrderStatus::Paid => None,
        }
    }

    /// Whether `self → to` is an edge of the lifecycle graph.
    ///
    /// Same-status requests are not edges; callers treat them as no-ops.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Ready => "ready",
            OrderStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct ParseOrderStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "in_progress" => Ok(OrderStatus::InProgress),
            "ready" => Ok(OrderStatus::Ready),
            "paid" => Ok(OrderStatus::Paid),
            other => Err(ParseOrderStatusError(other.to_string())),
        }
    }
}

// ============================================================================
// Create Request
// ============================================================================

/// One requested line of a new order.
///
/// Unit prices are taken from the dish catalog, never from the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineInput {
    pub dish_id: i64,
    pub qty: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Create order request as accepted by the lifecycle engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateOrderInput {
    pub table_id: i64,
    pub waiter_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<OrderLineInput>,
}

// ============================================================================
// Stock Requirement
// ============================================================================

/// Accumulated quantity of one ingredient needed by (or consumed for) an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockRequirement {
    pub ingredient_id: i64,
    pub quantity: Decimal,
}
