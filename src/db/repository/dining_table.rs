//! Dining Table Repository
//!
//! Registry CRUD. The `status` column is otherwise owned by the order engine;
//! the manual override in `update` (e.g. marking a table RESERVED) may be
//! overwritten by the next order lifecycle event.

use sqlx::SqlitePool;

use crate::db::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus};
use crate::error::{AppError, AppResult};

const COLUMNS: &str = "id, number, capacity, status";

pub async fn find_all(pool: &SqlitePool, status: Option<TableStatus>) -> AppResult<Vec<DiningTable>> {
    let tables = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table WHERE (?1 IS NULL OR status = ?1) ORDER BY number"
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<DiningTable>> {
    let table =
        sqlx::query_as::<_, DiningTable>(&format!("SELECT {COLUMNS} FROM dining_table WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(table)
}

pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> AppResult<DiningTable> {
    if data.number < 1 {
        return Err(AppError::validation(format!(
            "Table number must be a positive integer, got {}",
            data.number
        )));
    }
    let capacity = data.capacity.unwrap_or(4);
    if capacity < 1 {
        return Err(AppError::validation(format!(
            "Capacity must be a positive integer, got {capacity}"
        )));
    }

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM dining_table WHERE number = ?")
        .bind(data.number)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::conflict(format!(
            "Table number {} already exists",
            data.number
        )));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO dining_table (number, capacity, status) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(data.number)
    .bind(capacity)
    .bind(TableStatus::Available)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::database("Failed to create dining table"))
}

pub async fn update(pool: &SqlitePool, id: i64, data: DiningTableUpdate) -> AppResult<DiningTable> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {id} not found")))?;

    if let Some(number) = data.number {
        if number < 1 {
            return Err(AppError::validation(format!(
                "Table number must be a positive integer, got {number}"
            )));
        }
        // Uniqueness check excludes the row being updated
        let dup: Option<i64> =
            sqlx::query_scalar("SELECT id FROM dining_table WHERE number = ? AND id != ?")
                .bind(number)
                .bind(id)
                .fetch_optional(pool)
                .await?;
        if dup.is_some() {
            return Err(AppError::conflict(format!(
                "Table number {number} already exists"
            )));
        }
    }

    if let Some(capacity) = data.capacity
        && capacity < 1
    {
        return Err(AppError::validation(format!(
            "Capacity must be a positive integer, got {capacity}"
        )));
    }

    sqlx::query(
        "UPDATE dining_table SET number = COALESCE(?1, number), \
         capacity = COALESCE(?2, capacity), status = COALESCE(?3, status) WHERE id = ?4",
    )
    .bind(data.number)
    .bind(data.capacity)
    .bind(data.status)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {id} not found")))
}

/// Delete a table; rejected while OCCUPIED to guard against mid-service loss
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let table = find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {id} not found")))?;

    if table.status == TableStatus::Occupied {
        return Err(AppError::conflict("Cannot delete an occupied table"));
    }

    // Settled orders keep their table reference for reporting
    let on_record: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE table_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if on_record > 0 {
        return Err(AppError::conflict(format!(
            "Cannot delete table {} with orders on record",
            table.number
        )));
    }

    sqlx::query("DELETE FROM dining_table WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
