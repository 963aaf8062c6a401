//! Supply Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A recorded stock delivery (进货记录)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub id: i64,
    pub ingredient_id: i64,
    pub quantity: Decimal,
    pub supplier_name: String,
    pub created_at: i64,
}

/// Record supply payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyCreate {
    pub ingredient_id: i64,
    pub quantity: Decimal,
    pub supplier_name: String,
}
