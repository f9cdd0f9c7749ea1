//! Order engine operations
//!
//! Each mutation runs inside a single transaction: validation, line inserts,
//! total computation and the derived table-status write commit together or
//! not at all. Catalog reads for price snapshots happen inside the same
//! transaction so a concurrent menu edit cannot race a line insert.

use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::models::{
    DiningTable, Order, OrderCreate, OrderDetail, OrderFilter, OrderItemDetail, OrderItemInput,
    OrderStatus, OrderUpdate, TableStatus,
};
use crate::db::repository::menu_item;
use crate::error::{AppError, AppResult};
use crate::orders::money;
use crate::utils::now_millis;

/// Order joined with its table number, the shape every detail starts from
#[derive(Debug, sqlx::FromRow)]
struct OrderWithTable {
    id: i64,
    table_id: i64,
    table_number: i64,
    status: OrderStatus,
    total_cents: i64,
    notes: String,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    menu_item_id: i64,
    menu_item_name: String,
    quantity: i64,
    price_cents: i64,
    notes: String,
}

/// A requested line resolved against the catalog, price snapshotted
struct ResolvedLine {
    menu_item_id: i64,
    quantity: i64,
    price_cents: i64,
    notes: String,
}

const ORDER_WITH_TABLE: &str = "SELECT o.id, o.table_id, t.number AS table_number, o.status, \
     o.total_cents, o.notes, o.created_at, o.updated_at \
     FROM orders o JOIN dining_table t ON t.id = o.table_id";

const ITEMS_FOR_ORDER: &str = "SELECT oi.id, oi.menu_item_id, mi.name AS menu_item_name, \
     oi.quantity, oi.price_cents, oi.notes \
     FROM order_item oi JOIN menu_item mi ON mi.id = oi.menu_item_id \
     WHERE oi.order_id = ? ORDER BY oi.id";

// ========== Mutations ==========

/// Create an order with at least one line, all-or-nothing.
///
/// Lines snapshot the catalog price at this instant; the table is marked
/// OCCUPIED unconditionally, even when another order already holds it.
pub async fn create_order(pool: &SqlitePool, data: OrderCreate) -> AppResult<OrderDetail> {
    let mut tx = pool.begin().await?;

    let table: Option<DiningTable> =
        sqlx::query_as("SELECT id, number, capacity, status FROM dining_table WHERE id = ?")
            .bind(data.table_id)
            .fetch_optional(&mut *tx)
            .await?;
    let table = table
        .ok_or_else(|| AppError::not_found(format!("Table {} not found", data.table_id)))?;

    let (lines, sum) = resolve_lines(&mut tx, &data.items).await?;
    // Half-up rounding happens once, on the grand sum
    let total_cents = money::to_cents(money::round2(sum));

    let now = now_millis();
    let order_id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (table_id, status, total_cents, notes, created_at, updated_at) \
         VALUES (?, 'PENDING', ?, ?, ?, ?) RETURNING id",
    )
    .bind(table.id)
    .bind(total_cents)
    .bind(data.notes.unwrap_or_default())
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    insert_lines(&mut tx, order_id, &lines).await?;

    sqlx::query("UPDATE dining_table SET status = ? WHERE id = ?")
        .bind(TableStatus::Occupied)
        .bind(table.id)
        .execute(&mut *tx)
        .await?;

    let detail = fetch_detail(&mut tx, order_id).await?;
    tx.commit().await?;

    tracing::info!(
        order_id,
        table_id = table.id,
        total = %detail.total_amount,
        "Order created"
    );
    Ok(detail)
}

/// Append lines to an existing order.
///
/// Allowed in every non-terminal state including SERVED, so late add-ons can
/// still be billed before payment. The table status is not touched.
pub async fn add_items(
    pool: &SqlitePool,
    order_id: i64,
    items: Vec<OrderItemInput>,
) -> AppResult<OrderDetail> {
    let mut tx = pool.begin().await?;

    let order = fetch_order(&mut tx, order_id).await?;
    if order.status == OrderStatus::Paid {
        return Err(AppError::conflict(format!(
            "Cannot add items to paid order {order_id}"
        )));
    }

    let (lines, sum) = resolve_lines(&mut tx, &items).await?;
    // The prior total and the new lines' sum are rounded separately, then the
    // result is rounded again. Historical totals depend on this exact
    // sequence; do not collapse it into a single grand-sum round.
    let new_total = money::round2(order.total_amount() + money::round2(sum));

    insert_lines(&mut tx, order_id, &lines).await?;

    sqlx::query("UPDATE orders SET total_cents = ?, updated_at = ? WHERE id = ?")
        .bind(money::to_cents(new_total))
        .bind(now_millis())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    let detail = fetch_detail(&mut tx, order_id).await?;
    tx.commit().await?;

    tracing::info!(order_id, added = lines.len(), total = %detail.total_amount, "Items added");
    Ok(detail)
}

/// Apply a status transition and/or update the order notes.
///
/// A transition landing on PAID runs the table-release rule for the order's
/// table inside the same transaction, excluding this order from the active
/// count since it is now settled.
pub async fn update_status(
    pool: &SqlitePool,
    order_id: i64,
    data: OrderUpdate,
) -> AppResult<OrderDetail> {
    let mut tx = pool.begin().await?;

    let order = fetch_order(&mut tx, order_id).await?;
    let now = now_millis();

    if let Some(next) = data.status {
        if !order.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: order.status,
                to: next,
                allowed: order.status.allowed_next().to_vec(),
            });
        }

        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(next)
            .bind(now)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        if next == OrderStatus::Paid {
            release_table_if_idle(&mut tx, order.table_id, order.id).await?;
        }

        tracing::info!(order_id, from = %order.status, to = %next, "Order status updated");
    }

    if let Some(notes) = data.notes {
        sqlx::query("UPDATE orders SET notes = ?, updated_at = ? WHERE id = ?")
            .bind(notes)
            .bind(now)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
    }

    let detail = fetch_detail(&mut tx, order_id).await?;
    tx.commit().await?;
    Ok(detail)
}

/// Cancel an order that has not been served or paid.
///
/// Deletes the order and its lines, then runs the table-release rule with the
/// deleted id excluded. Deletion and the active-count read commit as one
/// unit, so no sibling transition can interleave between them.
pub async fn cancel_order(pool: &SqlitePool, order_id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let order = fetch_order(&mut tx, order_id).await?;
    if matches!(order.status, OrderStatus::Served | OrderStatus::Paid) {
        return Err(AppError::conflict(format!(
            "Cannot cancel a served or paid order ({order_id} is {})",
            order.status
        )));
    }

    // Lines cascade
    sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    release_table_if_idle(&mut tx, order.table_id, order.id).await?;

    tx.commit().await?;
    tracing::info!(order_id, table_id = order.table_id, "Order cancelled");
    Ok(())
}

// ========== Reads ==========

pub async fn get_order(pool: &SqlitePool, order_id: i64) -> AppResult<OrderDetail> {
    let mut conn = pool.acquire().await?;
    fetch_detail(&mut conn, order_id).await
}

/// List orders, newest-first, optionally filtered by status and/or table
pub async fn list_orders(pool: &SqlitePool, filter: OrderFilter) -> AppResult<Vec<OrderDetail>> {
    let mut conn = pool.acquire().await?;
    let sql = format!(
        "{ORDER_WITH_TABLE} WHERE (?1 IS NULL OR o.status = ?1) \
         AND (?2 IS NULL OR o.table_id = ?2) \
         ORDER BY o.created_at DESC, o.id DESC"
    );
    let rows: Vec<OrderWithTable> = sqlx::query_as(&sql)
        .bind(filter.status)
        .bind(filter.table_id)
        .fetch_all(&mut *conn)
        .await?;
    load_details(&mut conn, rows).await
}

/// All non-paid orders, oldest first
pub async fn list_active_orders(pool: &SqlitePool) -> AppResult<Vec<OrderDetail>> {
    let mut conn = pool.acquire().await?;
    let sql = format!(
        "{ORDER_WITH_TABLE} WHERE o.status != ? ORDER BY o.created_at ASC, o.id ASC"
    );
    let rows: Vec<OrderWithTable> = sqlx::query_as(&sql)
        .bind(OrderStatus::Paid)
        .fetch_all(&mut *conn)
        .await?;
    load_details(&mut conn, rows).await
}

/// Orders the kitchen still has to act on (PENDING, PREPARING), strict FIFO.
///
/// Creation order is load-bearing here: kitchen staff work tickets oldest
/// first.
pub async fn list_kitchen_orders(pool: &SqlitePool) -> AppResult<Vec<OrderDetail>> {
    let mut conn = pool.acquire().await?;
    let sql = format!(
        "{ORDER_WITH_TABLE} WHERE o.status IN (?, ?) ORDER BY o.created_at ASC, o.id ASC"
    );
    let rows: Vec<OrderWithTable> = sqlx::query_as(&sql)
        .bind(OrderStatus::Pending)
        .bind(OrderStatus::Preparing)
        .fetch_all(&mut *conn)
        .await?;
    load_details(&mut conn, rows).await
}

// ========== Internals ==========

/// Table-release rule: free the table when no non-paid order other than
/// `exclude_order_id` references it. The sole mechanism that sets a table
/// back to AVAILABLE; invoked only from the paid transition and cancellation.
async fn release_table_if_idle(
    conn: &mut SqliteConnection,
    table_id: i64,
    exclude_order_id: i64,
) -> AppResult<()> {
    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE table_id = ? AND status != ? AND id != ?",
    )
    .bind(table_id)
    .bind(OrderStatus::Paid)
    .bind(exclude_order_id)
    .fetch_one(&mut *conn)
    .await?;

    if active == 0 {
        sqlx::query("UPDATE dining_table SET status = ? WHERE id = ?")
            .bind(TableStatus::Available)
            .bind(table_id)
            .execute(&mut *conn)
            .await?;
        tracing::debug!(table_id, "Table released");
    }
    Ok(())
}

/// Validate every requested line against the catalog and snapshot prices.
/// Any bad line fails the whole call before a single row is written.
async fn resolve_lines(
    conn: &mut SqliteConnection,
    items: &[OrderItemInput],
) -> AppResult<(Vec<ResolvedLine>, Decimal)> {
    if items.is_empty() {
        return Err(AppError::validation("At least one item is required"));
    }

    let mut lines = Vec::with_capacity(items.len());
    let mut sum = Decimal::ZERO;
    for input in items {
        money::validate_quantity(input.quantity)?;

        let item = menu_item::find_available(&mut *conn, input.menu_item_id).await?;

        sum += money::line_subtotal(input.quantity, item.price_cents);
        lines.push(ResolvedLine {
            menu_item_id: item.id,
            quantity: input.quantity,
            price_cents: item.price_cents,
            notes: input.notes.clone().unwrap_or_default(),
        });
    }
    Ok((lines, sum))
}

async fn insert_lines(
    conn: &mut SqliteConnection,
    order_id: i64,
    lines: &[ResolvedLine],
) -> AppResult<()> {
    for line in lines {
        sqlx::query(
            "INSERT INTO order_item (order_id, menu_item_id, quantity, price_cents, notes) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(order_id)
        .bind(line.menu_item_id)
        .bind(line.quantity)
        .bind(line.price_cents)
        .bind(&line.notes)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_order(conn: &mut SqliteConnection, order_id: i64) -> AppResult<Order> {
    let order: Option<Order> = sqlx::query_as(
        "SELECT id, table_id, status, total_cents, notes, created_at, updated_at \
         FROM orders WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;
    order.ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))
}

async fn fetch_detail(conn: &mut SqliteConnection, order_id: i64) -> AppResult<OrderDetail> {
    let sql = format!("{ORDER_WITH_TABLE} WHERE o.id = ?");
    let row: Option<OrderWithTable> = sqlx::query_as(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;
    let row = row.ok_or_else(|| AppError::not_found(format!("Order {order_id} not found")))?;
    detail_from_row(conn, row).await
}

async fn load_details(
    conn: &mut SqliteConnection,
    rows: Vec<OrderWithTable>,
) -> AppResult<Vec<OrderDetail>> {
    let mut details = Vec::with_capacity(rows.len());
    for row in rows {
        details.push(detail_from_row(conn, row).await?);
    }
    Ok(details)
}

async fn detail_from_row(
    conn: &mut SqliteConnection,
    row: OrderWithTable,
) -> AppResult<OrderDetail> {
    let item_rows: Vec<ItemRow> = sqlx::query_as(ITEMS_FOR_ORDER)
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

    let items = item_rows
        .into_iter()
        .map(|i| OrderItemDetail {
            id: i.id,
            menu_item_id: i.menu_item_id,
            menu_item_name: i.menu_item_name,
            quantity: i.quantity,
            price: money::from_cents(i.price_cents),
            subtotal: money::line_subtotal(i.quantity, i.price_cents),
            notes: i.notes,
        })
        .collect();

    Ok(OrderDetail {
        id: row.id,
        table_id: row.table_id,
        table_number: row.table_number,
        status: row.status,
        total_amount: money::from_cents(row.total_cents),
        notes: row.notes,
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
