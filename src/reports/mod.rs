//! Reporting Aggregator
//!
//! Read-only derived views over committed order data: daily revenue summary,
//! all-time item popularity, the kitchen board and the floor map. No
//! state-machine logic lives here; everything is re-derived per call.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::models::{OrderDetail, OrderStatus, TableStatus};
use crate::error::AppResult;
use crate::orders::{engine, money};
use crate::utils::{today_utc_iso, today_utc_range};

// ============================================================================
// Response Types
// ============================================================================

/// One entry of the popularity rankings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularToday {
    pub id: i64,
    pub name: String,
    pub total_ordered: i64,
}

/// Today's summary (UTC calendar day)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub total_orders: i64,
    /// Revenue counts paid orders only
    pub revenue: Decimal,
    pub avg_order_value: Decimal,
    pub popular_items: Vec<PopularToday>,
}

/// All-time popularity entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularItem {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub category_id: i64,
    pub total_ordered: i64,
    /// Number of distinct orders the item appeared on
    pub order_count: i64,
}

/// Kitchen board: open tickets grouped by status, FIFO inside each group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenView {
    pub pending: Vec<OrderDetail>,
    pub preparing: Vec<OrderDetail>,
}

/// One active order on the floor map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorOrder {
    pub id: i64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub item_count: i64,
    pub created_at: i64,
}

/// One table on the floor map with its active (non-paid) orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorTable {
    pub id: i64,
    pub number: i64,
    pub capacity: i64,
    pub status: TableStatus,
    pub active_orders: Vec<FloorOrder>,
    pub total_active_amount: Decimal,
}

// ============================================================================
// Queries
// ============================================================================

#[derive(sqlx::FromRow)]
struct PopularRow {
    id: i64,
    name: String,
    total_ordered: i64,
}

#[derive(sqlx::FromRow)]
struct PopularAllTimeRow {
    id: i64,
    name: String,
    price_cents: i64,
    category_id: i64,
    total_ordered: i64,
    order_count: i64,
}

#[derive(sqlx::FromRow)]
struct FloorOrderRow {
    id: i64,
    status: OrderStatus,
    total_cents: i64,
    item_count: i64,
    created_at: i64,
}

/// Today's order count, paid revenue, average order value and top-5 items
pub async fn daily_summary(pool: &SqlitePool) -> AppResult<DailySummary> {
    let (start, end) = today_utc_range();

    let total_orders: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at >= ? AND created_at < ?")
            .bind(start)
            .bind(end)
            .fetch_one(pool)
            .await?;

    let revenue_cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_cents), 0) FROM orders \
         WHERE status = ? AND created_at >= ? AND created_at < ?",
    )
    .bind(OrderStatus::Paid)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    let revenue = money::from_cents(revenue_cents);
    let avg_order_value = if total_orders > 0 {
        money::round2(revenue / Decimal::from(total_orders))
    } else {
        Decimal::ZERO
    };

    // Top-5 today across all order statuses
    let rows: Vec<PopularRow> = sqlx::query_as(
        "SELECT mi.id, mi.name, CAST(SUM(oi.quantity) AS INTEGER) AS total_ordered \
         FROM menu_item mi \
         JOIN order_item oi ON oi.menu_item_id = mi.id \
         JOIN orders o ON o.id = oi.order_id \
         WHERE o.created_at >= ? AND o.created_at < ? \
         GROUP BY mi.id, mi.name \
         ORDER BY SUM(oi.quantity) DESC \
         LIMIT 5",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(DailySummary {
        date: today_utc_iso(),
        total_orders,
        revenue,
        avg_order_value,
        popular_items: rows
            .into_iter()
            .map(|r| PopularToday {
                id: r.id,
                name: r.name,
                total_ordered: r.total_ordered,
            })
            .collect(),
    })
}

/// All-time top-10 items by summed quantity, with distinct-order counts
pub async fn popular_items(pool: &SqlitePool) -> AppResult<Vec<PopularItem>> {
    let rows: Vec<PopularAllTimeRow> = sqlx::query_as(
        "SELECT mi.id, mi.name, mi.price_cents, mi.category_id, \
         CAST(SUM(oi.quantity) AS INTEGER) AS total_ordered, \
         COUNT(DISTINCT oi.order_id) AS order_count \
         FROM menu_item mi \
         JOIN order_item oi ON oi.menu_item_id = mi.id \
         GROUP BY mi.id, mi.name, mi.price_cents, mi.category_id \
         ORDER BY SUM(oi.quantity) DESC \
         LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| PopularItem {
            id: r.id,
            name: r.name,
            price: money::from_cents(r.price_cents),
            category_id: r.category_id,
            total_ordered: r.total_ordered,
            order_count: r.order_count,
        })
        .collect())
}

/// Open kitchen tickets grouped by status, oldest first inside each group
pub async fn kitchen_view(pool: &SqlitePool) -> AppResult<KitchenView> {
    let orders = engine::list_kitchen_orders(pool).await?;
    let (pending, preparing): (Vec<OrderDetail>, Vec<OrderDetail>) = orders
        .into_iter()
        .partition(|o| o.status == OrderStatus::Pending);
    Ok(KitchenView { pending, preparing })
}

/// Every table with its active orders and owed amounts, for the floor staff
pub async fn floor_map(pool: &SqlitePool) -> AppResult<Vec<FloorTable>> {
    let tables = crate::db::repository::dining_table::find_all(pool, None).await?;

    let mut result = Vec::with_capacity(tables.len());
    for table in tables {
        let rows: Vec<FloorOrderRow> = sqlx::query_as(
            "SELECT o.id, o.status, o.total_cents, o.created_at, \
             CAST(COALESCE((SELECT SUM(quantity) FROM order_item WHERE order_id = o.id), 0) AS INTEGER) AS item_count \
             FROM orders o \
             WHERE o.table_id = ? AND o.status != ? \
             ORDER BY o.created_at ASC, o.id ASC",
        )
        .bind(table.id)
        .bind(OrderStatus::Paid)
        .fetch_all(pool)
        .await?;

        let total_active_amount = money::round2(
            rows.iter()
                .map(|r| money::from_cents(r.total_cents))
                .sum::<Decimal>(),
        );

        result.push(FloorTable {
            id: table.id,
            number: table.number,
            capacity: table.capacity,
            status: table.status,
            active_orders: rows
                .into_iter()
                .map(|r| FloorOrder {
                    id: r.id,
                    status: r.status,
                    total_amount: money::from_cents(r.total_cents),
                    item_count: r.item_count,
                    created_at: r.created_at,
                })
                .collect(),
            total_active_amount,
        });
    }
    Ok(result)
}
