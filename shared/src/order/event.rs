//! Order events - facts published after a lifecycle operation commits

use super::types::{OrderStatus, StockRequirement};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order event
///
/// Emitted only after the owning transaction has committed, so a subscriber
/// never observes an operation that was rolled back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Order this event belongs to
    pub order_id: i64,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Event type
    pub event_type: OrderEventType,
    /// Event payload
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    OrderCreated,
    StatusChanged,
    OrderClosed,
    OrderDeleted,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderCreated => write!(f, "ORDER_CREATED"),
            OrderEventType::StatusChanged => write!(f, "STATUS_CHANGED"),
            OrderEventType::OrderClosed => write!(f, "ORDER_CLOSED"),
            OrderEventType::OrderDeleted => write!(f, "ORDER_DELETED"),
        }
    }
}

/// Event payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    OrderCreated {
        table_id: i64,
        waiter_id: i64,
        total: Decimal,
        item_count: usize,
        /// Stock deducted for this order
        consumed: Vec<StockRequirement>,
    },
    StatusChanged {
        from: OrderStatus,
        to: OrderStatus,
        /// Set when the transition released the table
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_freed: Option<i64>,
    },
    OrderClosed {
        table_id: i64,
        total: Decimal,
    },
    OrderDeleted {
        table_id: i64,
        /// Stock returned to the ledger
        restored: Vec<StockRequirement>,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> OrderEventType {
        match self {
            EventPayload::OrderCreated { .. } => OrderEventType::OrderCreated,
            EventPayload::StatusChanged { .. } => OrderEventType::StatusChanged,
            EventPayload::OrderClosed { .. } => OrderEventType::OrderClosed,
            EventPayload::OrderDeleted { .. } => OrderEventType::OrderDeleted,
        }
    }
}

impl OrderEvent {
    /// Build an event stamped with the current server time
    pub fn new(order_id: i64, payload: EventPayload) -> Self {
        Self {
            event_id: crate::util::event_id(),
            order_id,
            timestamp: crate::util::now_millis(),
            event_type: payload.event_type(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_follows_payload() {
        let event = OrderEvent::new(
            7,
            EventPayload::StatusChanged {
                from: OrderStatus::New,
                to: OrderStatus::InProgress,
                table_freed: None,
            },
        );
        assert_eq!(event.event_type, OrderEventType::StatusChanged);
        assert_eq!(event.order_id, 7);
        assert!(!event.event_id.is_empty());
    }

    #[test]
    fn test_payload_tagged_serialization() {
        let payload = EventPayload::OrderClosed {
            table_id: 3,
            total: Decimal::new(2500, 2),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "ORDER_CLOSED");
        assert_eq!(json["table_id"], 3);
    }
}
