//! Randomized replay: after every operation, a table is OCCUPIED iff at
//! least one non-paid order references it.

mod common;

use rand::prelude::*;

use common::{line, setup};
use dinesync::db::models::{OrderCreate, OrderStatus, OrderUpdate, TableStatus};
use dinesync::db::repository::dining_table;
use dinesync::orders::engine;

const STEPS: usize = 200;

async fn assert_occupancy_consistent(pool: &sqlx::SqlitePool, step: usize) {
    let tables = dining_table::find_all(pool, None).await.expect("tables");
    for table in tables {
        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE table_id = ? AND status != 'PAID'",
        )
        .bind(table.id)
        .fetch_one(pool)
        .await
        .expect("active count");

        match table.status {
            TableStatus::Occupied => assert!(
                active > 0,
                "step {step}: table {} OCCUPIED with no active orders",
                table.number
            ),
            TableStatus::Available | TableStatus::Reserved => assert_eq!(
                active, 0,
                "step {step}: table {} {} with {active} active orders",
                table.number, table.status
            ),
        }
    }
}

#[tokio::test]
async fn occupancy_matches_active_orders_after_every_step() {
    let fx = setup().await;
    // Fixed seed so failures replay
    let mut rng = StdRng::seed_from_u64(0x5EED);

    let tables = [fx.t1.id, fx.t2.id];
    let items = [fx.burger.id, fx.salad.id];
    let mut live_orders: Vec<i64> = Vec::new();

    for step in 0..STEPS {
        match rng.gen_range(0..4) {
            // Create a new order on a random table
            0 => {
                let table_id = *tables.choose(&mut rng).unwrap();
                let order = engine::create_order(
                    fx.pool(),
                    OrderCreate {
                        table_id,
                        items: vec![line(*items.choose(&mut rng).unwrap(), rng.gen_range(1..4))],
                        notes: None,
                    },
                )
                .await
                .expect("create");
                live_orders.push(order.id);
            }
            // Advance a random live order one valid step
            1 => {
                if let Some(&id) = live_orders.choose(&mut rng) {
                    let order = engine::get_order(fx.pool(), id).await.expect("get");
                    if let Some(&next) = order.status.allowed_next().choose(&mut rng) {
                        engine::update_status(
                            fx.pool(),
                            id,
                            OrderUpdate {
                                status: Some(next),
                                notes: None,
                            },
                        )
                        .await
                        .expect("valid transition");
                        if next == OrderStatus::Paid {
                            live_orders.retain(|&o| o != id);
                        }
                    }
                }
            }
            // Try to cancel a random live order; served ones refuse
            2 => {
                if let Some(&id) = live_orders.choose(&mut rng) {
                    let order = engine::get_order(fx.pool(), id).await.expect("get");
                    let res = engine::cancel_order(fx.pool(), id).await;
                    if order.status == OrderStatus::Served {
                        res.expect_err("served orders cannot be cancelled");
                    } else {
                        res.expect("cancel");
                        live_orders.retain(|&o| o != id);
                    }
                }
            }
            // Add a line to a random live order
            _ => {
                if let Some(&id) = live_orders.choose(&mut rng) {
                    engine::add_items(
                        fx.pool(),
                        id,
                        vec![line(*items.choose(&mut rng).unwrap(), rng.gen_range(1..3))],
                    )
                    .await
                    .expect("live orders are never paid");
                }
            }
        }

        assert_occupancy_consistent(fx.pool(), step).await;
    }
}
