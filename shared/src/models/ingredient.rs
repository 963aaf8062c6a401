//! Ingredient Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ingredient entity (库存原料)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    /// Unit of measure (g, ml, pcs, ...)
    pub unit: String,
    /// Quantity on hand, never negative
    pub quantity: Decimal,
    /// Low-stock threshold
    pub min_quantity: Decimal,
}

impl Ingredient {
    /// 库存是否低于阈值（含等于）
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn flour(quantity: &str, min: &str) -> Ingredient {
        Ingredient {
            id: 1,
            name: "Flour".to_string(),
            unit: "g".to_string(),
            quantity: Decimal::from_str(quantity).unwrap(),
            min_quantity: Decimal::from_str(min).unwrap(),
        }
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        assert!(flour("5", "5").is_low_stock());
        assert!(flour("4.5", "5").is_low_stock());
        assert!(!flour("5.01", "5").is_low_stock());
    }
}
