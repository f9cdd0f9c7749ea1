//! Order lifecycle: creation, totals, transitions, add-ons, cancellation and
//! the table-release rule.

mod common;

use common::{dec, line, order_count, order_item_count, setup, table_status};
use dinesync::db::models::{OrderCreate, OrderFilter, OrderStatus, OrderUpdate, TableStatus};
use dinesync::error::AppError;
use dinesync::orders::engine;

fn create_payload(table_id: i64, items: Vec<dinesync::db::models::OrderItemInput>) -> OrderCreate {
    OrderCreate {
        table_id,
        items,
        notes: None,
    }
}

fn status_update(status: OrderStatus) -> OrderUpdate {
    OrderUpdate {
        status: Some(status),
        notes: None,
    }
}

#[tokio::test]
async fn create_order_computes_total_and_occupies_table() {
    let fx = setup().await;

    // 2 × 6.99 + 1 × 4.99 = 18.97
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 2), line(fx.salad.id, 1)]),
    )
    .await
    .expect("create order");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, dec("18.97"));
    assert_eq!(order.table_number, 1);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].menu_item_name, "Burger");
    assert_eq!(order.items[0].subtotal, dec("13.98"));
    assert_eq!(table_status(fx.pool(), fx.t1.id).await, TableStatus::Occupied);
}

#[tokio::test]
async fn line_prices_are_snapshotted_at_creation() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("create order");

    // Raise the menu price afterwards; the order total must not move
    dinesync::db::repository::menu_item::update(
        fx.pool(),
        fx.burger.id,
        dinesync::db::models::MenuItemUpdate {
            price: Some(dec("99.99")),
            ..Default::default()
        },
    )
    .await
    .expect("update price");

    let reread = engine::get_order(fx.pool(), order.id).await.expect("get");
    assert_eq!(reread.total_amount, dec("6.99"));
    assert_eq!(reread.items[0].price, dec("6.99"));
}

#[tokio::test]
async fn invalid_transition_is_rejected_with_allowed_set() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("create order");

    let err = engine::update_status(fx.pool(), order.id, status_update(OrderStatus::Served))
        .await
        .expect_err("pending -> served must fail");
    match err {
        AppError::InvalidTransition { from, to, allowed } => {
            assert_eq!(from, OrderStatus::Pending);
            assert_eq!(to, OrderStatus::Served);
            assert_eq!(allowed, vec![OrderStatus::Preparing, OrderStatus::Paid]);
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }

    // Unchanged on failure
    let reread = engine::get_order(fx.pool(), order.id).await.expect("get");
    assert_eq!(reread.status, OrderStatus::Pending);
}

#[tokio::test]
async fn same_status_update_is_rejected() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("create order");

    let err = engine::update_status(fx.pool(), order.id, status_update(OrderStatus::Pending))
        .await
        .expect_err("no-op transition must fail");
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

#[tokio::test]
async fn full_chain_succeeds_and_frees_table() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("create order");

    for next in [
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Paid,
    ] {
        let updated = engine::update_status(fx.pool(), order.id, status_update(next))
            .await
            .expect("transition");
        assert_eq!(updated.status, next);
    }

    // Last active order on the table: paying it releases the table
    assert_eq!(
        table_status(fx.pool(), fx.t1.id).await,
        TableStatus::Available
    );

    // PAID is terminal
    let err = engine::update_status(fx.pool(), order.id, status_update(OrderStatus::Pending))
        .await
        .expect_err("terminal state");
    assert!(err.to_string().contains("terminal state"));
}

#[tokio::test]
async fn pending_to_paid_shortcut_is_allowed() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.salad.id, 1)]),
    )
    .await
    .expect("create order");

    let paid = engine::update_status(fx.pool(), order.id, status_update(OrderStatus::Paid))
        .await
        .expect("direct settle");
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(
        table_status(fx.pool(), fx.t1.id).await,
        TableStatus::Available
    );
}

#[tokio::test]
async fn paying_one_of_two_orders_keeps_table_occupied() {
    let fx = setup().await;
    let first = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("first order");
    let _second = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.salad.id, 1)]),
    )
    .await
    .expect("second order");

    engine::update_status(fx.pool(), first.id, status_update(OrderStatus::Paid))
        .await
        .expect("pay first");

    // The sibling order still holds the table
    assert_eq!(table_status(fx.pool(), fx.t1.id).await, TableStatus::Occupied);
}

#[tokio::test]
async fn cancel_in_ready_frees_table() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("create order");
    engine::update_status(fx.pool(), order.id, status_update(OrderStatus::Preparing))
        .await
        .expect("preparing");
    engine::update_status(fx.pool(), order.id, status_update(OrderStatus::Ready))
        .await
        .expect("ready");

    engine::cancel_order(fx.pool(), order.id)
        .await
        .expect("cancel in ready");

    assert_eq!(order_count(fx.pool()).await, 0);
    assert_eq!(order_item_count(fx.pool()).await, 0);
    assert_eq!(
        table_status(fx.pool(), fx.t1.id).await,
        TableStatus::Available
    );

    let err = engine::get_order(fx.pool(), order.id)
        .await
        .expect_err("deleted");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn cancel_served_or_paid_is_rejected() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("create order");
    for next in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        engine::update_status(fx.pool(), order.id, status_update(next))
            .await
            .expect("transition");
    }

    let err = engine::cancel_order(fx.pool(), order.id)
        .await
        .expect_err("served cannot be cancelled");
    assert!(matches!(err, AppError::Conflict(_)));

    engine::update_status(fx.pool(), order.id, status_update(OrderStatus::Paid))
        .await
        .expect("pay");
    let err = engine::cancel_order(fx.pool(), order.id)
        .await
        .expect_err("paid cannot be cancelled");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn add_items_to_served_order_extends_total() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 2), line(fx.salad.id, 1)]),
    )
    .await
    .expect("create order");
    assert_eq!(order.total_amount, dec("18.97"));

    for next in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        engine::update_status(fx.pool(), order.id, status_update(next))
            .await
            .expect("transition");
    }

    // Late add-on is billed before payment: +1 × 4.99
    let updated = engine::add_items(fx.pool(), order.id, vec![line(fx.salad.id, 1)])
        .await
        .expect("add to served");
    assert_eq!(updated.total_amount, dec("23.96"));
    assert_eq!(updated.items.len(), 3);
    assert_eq!(updated.status, OrderStatus::Served);
}

#[tokio::test]
async fn add_items_to_paid_order_is_rejected() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("create order");
    engine::update_status(fx.pool(), order.id, status_update(OrderStatus::Paid))
        .await
        .expect("pay");

    let err = engine::add_items(fx.pool(), order.id, vec![line(fx.salad.id, 1)])
        .await
        .expect_err("paid orders cannot be extended");
    assert!(matches!(err, AppError::Conflict(_)));

    let reread = engine::get_order(fx.pool(), order.id).await.expect("get");
    assert_eq!(reread.items.len(), 1);
    assert_eq!(reread.total_amount, dec("6.99"));
}

#[tokio::test]
async fn failed_creation_persists_nothing() {
    let fx = setup().await;

    // Unavailable item in the middle of the list aborts the whole order
    let err = engine::create_order(
        fx.pool(),
        create_payload(
            fx.t1.id,
            vec![line(fx.burger.id, 1), line(fx.oyster.id, 1), line(fx.salad.id, 2)],
        ),
    )
    .await
    .expect_err("unavailable item");
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(err.to_string().contains("Oyster"));

    assert_eq!(order_count(fx.pool()).await, 0);
    assert_eq!(order_item_count(fx.pool()).await, 0);
    assert_eq!(
        table_status(fx.pool(), fx.t1.id).await,
        TableStatus::Available
    );

    // Nonexistent menu item id: same all-or-nothing behavior
    let err = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1), line(9999, 1)]),
    )
    .await
    .expect_err("missing menu item");
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(order_count(fx.pool()).await, 0);
}

#[tokio::test]
async fn create_order_input_validation() {
    let fx = setup().await;

    let err = engine::create_order(fx.pool(), create_payload(9999, vec![line(fx.burger.id, 1)]))
        .await
        .expect_err("missing table");
    assert!(matches!(err, AppError::NotFound(_)));

    let err = engine::create_order(fx.pool(), create_payload(fx.t1.id, vec![]))
        .await
        .expect_err("empty items");
    assert!(matches!(err, AppError::Validation(_)));

    let err = engine::create_order(fx.pool(), create_payload(fx.t1.id, vec![line(fx.burger.id, 0)]))
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, AppError::Validation(_)));

    let err = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, -2)]),
    )
    .await
    .expect_err("negative quantity");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn notes_only_update_leaves_status_alone() {
    let fx = setup().await;
    let order = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("create order");

    let updated = engine::update_status(
        fx.pool(),
        order.id,
        OrderUpdate {
            status: None,
            notes: Some("no onions".into()),
        },
    )
    .await
    .expect("notes update");

    assert_eq!(updated.status, OrderStatus::Pending);
    assert_eq!(updated.notes, "no onions");
}

#[tokio::test]
async fn reads_are_idempotent_and_filters_work() {
    let fx = setup().await;
    let o1 = engine::create_order(
        fx.pool(),
        create_payload(fx.t1.id, vec![line(fx.burger.id, 1)]),
    )
    .await
    .expect("o1");
    let o2 = engine::create_order(
        fx.pool(),
        create_payload(fx.t2.id, vec![line(fx.salad.id, 2)]),
    )
    .await
    .expect("o2");
    engine::update_status(fx.pool(), o2.id, status_update(OrderStatus::Preparing))
        .await
        .expect("prep o2");

    // Repeated reads return identical data absent writes
    let a = engine::get_order(fx.pool(), o1.id).await.expect("read 1");
    let b = engine::get_order(fx.pool(), o1.id).await.expect("read 2");
    assert_eq!(
        serde_json::to_value(&a).unwrap(),
        serde_json::to_value(&b).unwrap()
    );

    let pending = engine::list_orders(
        fx.pool(),
        OrderFilter {
            status: Some(OrderStatus::Pending),
            table_id: None,
        },
    )
    .await
    .expect("by status");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, o1.id);

    let on_t2 = engine::list_orders(
        fx.pool(),
        OrderFilter {
            status: None,
            table_id: Some(fx.t2.id),
        },
    )
    .await
    .expect("by table");
    assert_eq!(on_t2.len(), 1);
    assert_eq!(on_t2[0].id, o2.id);

    let active = engine::list_active_orders(fx.pool()).await.expect("active");
    assert_eq!(active.len(), 2);

    let kitchen = engine::list_kitchen_orders(fx.pool()).await.expect("kitchen");
    assert_eq!(kitchen.len(), 2);
    // FIFO: o1 was created first
    assert_eq!(kitchen[0].id, o1.id);
    assert_eq!(kitchen[1].id, o2.id);
}
