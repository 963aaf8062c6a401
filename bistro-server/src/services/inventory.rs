//! Inventory Service - restocking and stock queries
//!
//! The lifecycle engine owns negative (consumption) deltas; this service owns
//! the positive ones: a supply delivery is recorded and added to the ledger in
//! one transaction, with the same conflict retries as the engine.

use crate::orders::manager::DEFAULT_MAX_RETRIES;
use crate::orders::txn::{self, TxnError};
use crate::orders::{
    Interrupted, OpContext, OrderBackend, StockLedger, StockView, StoreError, SupplyLog,
    SupplyView,
};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{Ingredient, Supply, SupplyCreate};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(i64),

    #[error("Supply quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl From<Interrupted> for InventoryError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => InventoryError::Cancelled,
            Interrupted::DeadlineExceeded => InventoryError::DeadlineExceeded,
        }
    }
}

impl TxnError for InventoryError {
    fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::Storage(e) if e.is_retryable())
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        let message = err.to_string();
        match err {
            InventoryError::Storage(StoreError::Conflict(_)) => {
                AppError::with_message(ErrorCode::SystemBusy, message)
            }
            InventoryError::Storage(e) => {
                tracing::error!(error = %e, "Storage error occurred");
                AppError::database(message)
            }
            InventoryError::IngredientNotFound(id) => {
                AppError::with_message(ErrorCode::IngredientNotFound, message)
                    .with_detail("ingredient_id", id)
            }
            InventoryError::InvalidQuantity(qty) => {
                AppError::with_message(ErrorCode::InvalidSupplyQuantity, message)
                    .with_detail("quantity", qty.to_string())
            }
            InventoryError::Cancelled => AppError::client_disconnected(),
            InventoryError::DeadlineExceeded => AppError::timeout(),
        }
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Result of a recorded delivery
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SupplyReceipt {
    pub supply: Supply,
    /// Ingredient after the delivery was added
    pub ingredient: Ingredient,
}

pub struct InventoryService<B: OrderBackend> {
    backend: B,
    max_retries: u32,
}

impl<B: OrderBackend> std::fmt::Debug for InventoryService<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryService")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl<B: OrderBackend> InventoryService<B> {
    pub fn new(backend: B) -> Self {
        Self::with_max_retries(backend, DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(backend: B, max_retries: u32) -> Self {
        Self {
            backend,
            max_retries,
        }
    }

    /// 进货：写入进货记录并增加库存（同一事务，冲突时整体重试）
    pub fn record_supply(
        &self,
        ctx: &OpContext,
        supply: SupplyCreate,
    ) -> InventoryResult<SupplyReceipt> {
        if supply.quantity <= Decimal::ZERO {
            return Err(InventoryError::InvalidQuantity(supply.quantity));
        }

        txn::run_in_txn(&self.backend, ctx, self.max_retries, |txn| {
            if txn.get_ingredient(supply.ingredient_id)?.is_none() {
                return Err(InventoryError::IngredientNotFound(supply.ingredient_id));
            }
            let stored = txn.insert_supply(supply.clone())?;
            let ingredient = txn.apply_delta(stored.ingredient_id, stored.quantity)?;
            Ok(SupplyReceipt {
                supply: stored,
                ingredient,
            })
        })
    }

    /// Delivery history, newest first
    ///
    /// An unknown `ingredient_id` simply has no deliveries.
    pub fn list_supplies(
        &self,
        ctx: &OpContext,
        ingredient_id: Option<i64>,
    ) -> InventoryResult<Vec<Supply>> {
        txn::read(&self.backend, ctx, |txn| Ok(txn.list_supplies(ingredient_id)?))
    }

    /// All ingredients, ordered by id
    pub fn list_ingredients(&self, ctx: &OpContext) -> InventoryResult<Vec<Ingredient>> {
        txn::read(&self.backend, ctx, |txn| Ok(txn.list_ingredients()?))
    }

    /// Ingredients at or below their minimum threshold
    pub fn low_stock(&self, ctx: &OpContext) -> InventoryResult<Vec<Ingredient>> {
        Ok(self
            .list_ingredients(ctx)?
            .into_iter()
            .filter(Ingredient::is_low_stock)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::testing::FaultyBackend;
    use crate::orders::{OrderBackend, RedbBackend, StoreTxn};
    use std::str::FromStr;
    use tokio_util::sync::CancellationToken;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn stocked_backend() -> RedbBackend {
        let backend = RedbBackend::open_in_memory().unwrap();
        let mut txn = backend.begin().unwrap();
        for (id, name, qty, min) in [(1, "Flour", "0.5", "1"), (2, "Oil", "4", "1"), (3, "Salt", "1", "1")] {
            txn.put_ingredient(&Ingredient {
                id,
                name: name.to_string(),
                unit: "kg".to_string(),
                quantity: dec(qty),
                min_quantity: dec(min),
            })
            .unwrap();
        }
        txn.commit().unwrap();
        backend
    }

    fn service_with_stock() -> InventoryService<RedbBackend> {
        InventoryService::new(stocked_backend())
    }

    fn delivery(ingredient_id: i64, quantity: &str) -> SupplyCreate {
        SupplyCreate {
            ingredient_id,
            quantity: dec(quantity),
            supplier_name: "Molino Rossi".to_string(),
        }
    }

    #[test]
    fn test_record_supply_increments_stock() {
        let service = service_with_stock();

        let receipt = service
            .record_supply(&OpContext::background(), delivery(1, "2.5"))
            .unwrap();

        assert_eq!(receipt.supply.id, 1);
        assert_eq!(receipt.supply.quantity, dec("2.5"));
        assert_eq!(receipt.ingredient.quantity, dec("3.0"));

        let flour = service
            .list_ingredients(&OpContext::background())
            .unwrap()
            .into_iter()
            .find(|i| i.id == 1)
            .unwrap();
        assert_eq!(flour.quantity, dec("3"));
    }

    #[test]
    fn test_record_supply_rejects_non_positive() {
        let service = service_with_stock();
        for qty in ["0", "-1"] {
            let err = service
                .record_supply(&OpContext::background(), delivery(1, qty))
                .unwrap_err();
            assert!(matches!(err, InventoryError::InvalidQuantity(_)));
        }
    }

    #[test]
    fn test_record_supply_unknown_ingredient() {
        let service = service_with_stock();
        let err = service
            .record_supply(&OpContext::background(), delivery(9, "1"))
            .unwrap_err();
        assert!(matches!(err, InventoryError::IngredientNotFound(9)));
    }

    #[test]
    fn test_cancelled_supply_is_not_recorded() {
        let service = service_with_stock();
        let token = CancellationToken::new();
        token.cancel();

        let err = service
            .record_supply(
                &OpContext::background().cancellation(token),
                delivery(1, "10"),
            )
            .unwrap_err();
        assert!(matches!(err, InventoryError::Cancelled));

        // next supply gets the first id: nothing was written
        let receipt = service
            .record_supply(&OpContext::background(), delivery(1, "1"))
            .unwrap();
        assert_eq!(receipt.supply.id, 1);
        assert_eq!(receipt.ingredient.quantity, dec("1.5"));
    }

    #[test]
    fn test_low_stock_includes_threshold() {
        let service = service_with_stock();

        let low: Vec<i64> = service
            .low_stock(&OpContext::background())
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();

        // flour below, salt exactly at the minimum
        assert_eq!(low, vec![1, 3]);
    }

    #[test]
    fn test_supply_clears_low_stock() {
        let service = service_with_stock();
        service
            .record_supply(&OpContext::background(), delivery(1, "5"))
            .unwrap();

        let low: Vec<i64> = service
            .low_stock(&OpContext::background())
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(low, vec![3]);
    }

    #[test]
    fn test_supply_history_newest_first() {
        let service = service_with_stock();
        let ctx = OpContext::background();
        for (id, qty) in [(1, "2"), (2, "1"), (1, "3")] {
            service.record_supply(&ctx, delivery(id, qty)).unwrap();
        }

        let all: Vec<i64> = service
            .list_supplies(&ctx, None)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(all, vec![3, 2, 1]);

        let flour = service.list_supplies(&ctx, Some(1)).unwrap();
        assert_eq!(flour.len(), 2);
        assert_eq!(flour[0].quantity, dec("3"));
        assert!(flour.iter().all(|s| s.ingredient_id == 1));

        assert!(service.list_supplies(&ctx, Some(99)).unwrap().is_empty());
    }

    #[test]
    fn test_record_supply_retries_conflicts() {
        let backend = FaultyBackend::with_conflicts(stocked_backend(), 2);
        let service = InventoryService::with_max_retries(backend.clone(), 3);

        let receipt = service
            .record_supply(&OpContext::background(), delivery(2, "1.5"))
            .unwrap();

        assert_eq!(backend.attempts(), 3);
        // rolled-back attempts leave no supply rows and no id gaps
        assert_eq!(receipt.supply.id, 1);
        assert_eq!(receipt.ingredient.quantity, dec("5.5"));
        assert_eq!(
            service.list_supplies(&OpContext::background(), None).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_record_supply_conflict_budget_exhausted() {
        let backend = FaultyBackend::with_conflicts(stocked_backend(), 10);
        let service = InventoryService::with_max_retries(backend.clone(), 1);

        let err = service
            .record_supply(&OpContext::background(), delivery(2, "1"))
            .unwrap_err();

        assert!(matches!(err, InventoryError::Storage(StoreError::Conflict(_))));
        assert_eq!(backend.attempts(), 2);
        assert_eq!(AppError::from(err).code, ErrorCode::SystemBusy);

        let oil = service
            .list_ingredients(&OpContext::background())
            .unwrap()
            .into_iter()
            .find(|i| i.id == 2)
            .unwrap();
        assert_eq!(oil.quantity, dec("4"));
    }
}
