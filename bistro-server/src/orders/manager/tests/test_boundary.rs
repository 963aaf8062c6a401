use super::*;
use std::time::{Duration, Instant};

/// Stock, tables and orders exactly as seeded
fn assert_untouched<B: OrderBackend>(manager: &OrdersManager<B>) {
    assert_eq!(stock(manager, FLOUR), dec("5"));
    assert_eq!(stock(manager, TOMATO), dec("10"));
    for table_id in 1..=3 {
        assert_eq!(table_status(manager, table_id), TableStatus::Free);
    }
    assert_eq!(order_count(manager), 0);
}

fn faulty_manager(fault: Fault) -> OrdersManager<FaultyBackend> {
    OrdersManager::new(FaultyBackend::new(seeded_backend(), fault))
}

// ========================================================================
// Validation and lookups
// ========================================================================

#[test]
fn test_empty_order_rejected() {
    let manager = create_test_manager();
    let err = manager
        .create_order(&ctx(), order_input(1, vec![]))
        .unwrap_err();
    assert!(matches!(err, ManagerError::EmptyOrder));
    assert_untouched(&manager);
}

#[test]
fn test_non_positive_quantity_rejected() {
    let manager = create_test_manager();
    for qty in [0, -2] {
        let err = manager
            .create_order(&ctx(), order_input(1, vec![line(WATER, 1), line(PIZZA, qty)]))
            .unwrap_err();
        assert!(matches!(err, ManagerError::Validation(_)), "qty {qty}");
    }
    assert_untouched(&manager);
}

#[test]
fn test_unknown_table() {
    let manager = create_test_manager();
    let err = manager
        .create_order(&ctx(), order_input(42, vec![line(PIZZA, 1)]))
        .unwrap_err();
    assert!(matches!(err, ManagerError::TableNotFound(42)));
    assert_untouched(&manager);
}

#[test]
fn test_unknown_and_inactive_dishes() {
    let manager = create_test_manager();

    let err = manager
        .create_order(&ctx(), order_input(1, vec![line(PIZZA, 1), line(77, 1)]))
        .unwrap_err();
    assert!(matches!(err, ManagerError::DishNotFound(77)));

    let err = manager
        .create_order(&ctx(), order_input(1, vec![line(OLD_SPECIAL, 1)]))
        .unwrap_err();
    assert!(matches!(err, ManagerError::DishNotFound(OLD_SPECIAL)));

    assert_untouched(&manager);
}

#[test]
fn test_recipe_ingredient_missing_from_ledger() {
    let backend = seeded_backend();
    let mut txn = backend.begin().unwrap();
    txn.put_dish(&dish(10, "Saffron risotto", "14.00", true)).unwrap();
    txn.put_recipe_line(&recipe(10, 99, "0.01")).unwrap();
    txn.commit().unwrap();
    let manager = OrdersManager::new(backend);

    let err = manager
        .create_order(&ctx(), order_input(1, vec![line(10, 1)]))
        .unwrap_err();

    assert!(matches!(err, ManagerError::IngredientNotFound(99)));
    assert_untouched(&manager);
}

#[test]
fn test_stock_can_reach_exactly_zero() {
    let manager = create_test_manager();
    manager
        .create_order(&ctx(), order_input(1, vec![line(FOCACCIA, 5)]))
        .unwrap();
    assert_eq!(stock(&manager, FLOUR), Decimal::ZERO);

    let err = manager
        .create_order(&ctx(), order_input(2, vec![line(FOCACCIA, 1)]))
        .unwrap_err();
    assert!(matches!(err, ManagerError::InsufficientStock { .. }));
    assert_eq!(stock(&manager, FLOUR), Decimal::ZERO);
}

#[test]
fn test_fractional_quantities() {
    let backend = seeded_backend();
    let mut txn = backend.begin().unwrap();
    txn.put_dish(&dish(11, "Bruschetta", "3.20", true)).unwrap();
    txn.put_recipe_line(&recipe(11, TOMATO, "0.35")).unwrap();
    txn.commit().unwrap();
    let manager = OrdersManager::new(backend);

    manager
        .create_order(&ctx(), order_input(1, vec![line(11, 3)]))
        .unwrap();

    assert_eq!(stock(&manager, TOMATO), dec("8.95"));
}

// ========================================================================
// Injected storage failures
// ========================================================================

#[test]
fn test_failure_at_table_update_rolls_back_everything() {
    let manager = faulty_manager(Fault::SetTableStatus);

    let err = manager
        .create_order(&ctx(), order_input(1, vec![line(PIZZA, 2)]))
        .unwrap_err();

    assert!(matches!(err, ManagerError::Storage(StoreError::Backend(_))));
    assert_untouched(&manager);
}

#[test]
fn test_failure_at_second_deduction_rolls_back_first() {
    // pizza deducts flour then tomato
    let manager = faulty_manager(Fault::ApplyDelta(1));

    let err = manager
        .create_order(&ctx(), order_input(1, vec![line(PIZZA, 1)]))
        .unwrap_err();

    assert!(matches!(err, ManagerError::Storage(_)));
    assert_untouched(&manager);
}

#[test]
fn test_failure_at_item_insert_or_consumption_record() {
    for fault in [Fault::AppendItem, Fault::RecordConsumption] {
        let manager = faulty_manager(fault);
        let err = manager
            .create_order(&ctx(), order_input(1, vec![line(PIZZA, 1)]))
            .unwrap_err();
        assert!(matches!(err, ManagerError::Storage(_)));
        assert_untouched(&manager);
    }
}

#[test]
fn test_backend_errors_are_not_retried() {
    let backend = FaultyBackend::new(seeded_backend(), Fault::SetTableStatus);
    let manager = OrdersManager::new(backend.clone());

    manager
        .create_order(&ctx(), order_input(1, vec![line(PIZZA, 1)]))
        .unwrap_err();

    assert_eq!(backend.attempts(), 1);
}

#[test]
fn test_failed_close_keeps_order_ready() {
    let backend = seeded_backend();
    let healthy = OrdersManager::new(backend.clone());
    let order = healthy
        .create_order(&ctx(), order_input(1, vec![line(WATER, 1)]))
        .unwrap();
    advance_to_ready(&healthy, order.id);

    let manager = OrdersManager::new(FaultyBackend::new(backend, Fault::SetTableStatus));
    manager.close_order(&ctx(), order.id).unwrap_err();

    let reloaded = healthy.get_order(&ctx(), order.id).unwrap();
    assert_eq!(reloaded.status, OrderStatus::Ready);
    assert_eq!(table_status(&healthy, 1), TableStatus::Busy);
}

// ========================================================================
// Conflict retries
// ========================================================================

#[test]
fn test_conflicts_are_retried_transparently() {
    let backend = FaultyBackend::with_conflicts(seeded_backend(), 2);
    let manager = OrdersManager::with_options(backend.clone(), 16, 3);

    let order = manager
        .create_order(&ctx(), order_input(1, vec![line(PIZZA, 2)]))
        .unwrap();

    assert_eq!(backend.attempts(), 3);
    assert_eq!(stock(&manager, FLOUR), dec("1"));
    assert_eq!(order_count(&manager), 1);
    assert_eq!(order.id, manager.list_orders(&ctx(), None).unwrap()[0].id);
}

#[test]
fn test_conflicts_exhaust_retry_budget() {
    let backend = FaultyBackend::with_conflicts(seeded_backend(), 10);
    let manager = OrdersManager::with_options(backend.clone(), 16, 2);

    let err = manager
        .create_order(&ctx(), order_input(1, vec![line(PIZZA, 1)]))
        .unwrap_err();

    assert!(matches!(err, ManagerError::Storage(StoreError::Conflict(_))));
    assert_eq!(backend.attempts(), 3);

    backend.conflicts.store(0, Ordering::SeqCst);
    assert_untouched(&manager);
}

// ========================================================================
// Cancellation and deadlines
// ========================================================================

#[test]
fn test_cancelled_context_performs_no_mutation() {
    let manager = create_test_manager();
    let token = CancellationToken::new();
    token.cancel();
    let cancelled = OpContext::background().cancellation(token);

    let err = manager
        .create_order(&cancelled, order_input(1, vec![line(PIZZA, 1)]))
        .unwrap_err();

    assert!(matches!(err, ManagerError::Cancelled));
    assert_untouched(&manager);
}

#[test]
fn test_expired_deadline_performs_no_mutation() {
    let manager = create_test_manager();
    let order = manager
        .create_order(&ctx(), order_input(1, vec![line(PIZZA, 1)]))
        .unwrap();
    let expired = OpContext::background().deadline(Instant::now() - Duration::from_millis(5));

    assert!(matches!(
        manager.update_status(&expired, order.id, OrderStatus::InProgress),
        Err(ManagerError::DeadlineExceeded)
    ));
    assert!(matches!(
        manager.delete_order(&expired, order.id),
        Err(ManagerError::DeadlineExceeded)
    ));

    let reloaded = manager.get_order(&ctx(), order.id).unwrap();
    assert_eq!(reloaded.status, OrderStatus::New);
    assert_eq!(stock(&manager, FLOUR), dec("3"));
}

#[test]
fn test_cancel_during_write_rolls_back() {
    let token = CancellationToken::new();
    let manager = faulty_manager(Fault::CancelOnSetTable(token.clone()));
    let ctx = OpContext::background().cancellation(token);

    let err = manager
        .create_order(&ctx, order_input(1, vec![line(PIZZA, 1)]))
        .unwrap_err();

    assert!(matches!(err, ManagerError::Cancelled));
    assert_untouched(&manager);
}
