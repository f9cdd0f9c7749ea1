//! Menu Item Repository
//!
//! Catalog CRUD. The order engine only consumes reads; price changes here
//! never touch snapshotted order lines.

use sqlx::SqlitePool;

use crate::db::models::{MenuItem, MenuItemCreate, MenuItemUpdate};
use crate::error::{AppError, AppResult};
use crate::orders::money;
use crate::utils::now_millis;

const COLUMNS: &str = "id, name, description, price_cents, category_id, is_available, created_at";

/// List catalog items, optionally by category and/or availability
pub async fn find_all(
    pool: &SqlitePool,
    category_id: Option<i64>,
    available_only: bool,
) -> AppResult<Vec<MenuItem>> {
    let items = sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_item \
         WHERE (?1 IS NULL OR category_id = ?1) AND (?2 = 0 OR is_available = 1) \
         ORDER BY name"
    ))
    .bind(category_id)
    .bind(available_only)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<MenuItem>> {
    let item =
        sqlx::query_as::<_, MenuItem>(&format!("SELECT {COLUMNS} FROM menu_item WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(item)
}

/// Resolve an item that must exist and be orderable.
///
/// Generic over the executor so the order engine can run it inside the same
/// transaction as the line insert it is validating.
pub async fn find_available<'e, E>(executor: E, id: i64) -> AppResult<MenuItem>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let item =
        sqlx::query_as::<_, MenuItem>(&format!("SELECT {COLUMNS} FROM menu_item WHERE id = ?"))
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Menu item {id} not found")))?;
    if !item.is_available {
        return Err(AppError::conflict(format!(
            "'{}' is currently unavailable",
            item.name
        )));
    }
    Ok(item)
}

pub async fn create(pool: &SqlitePool, data: MenuItemCreate) -> AppResult<MenuItem> {
    if data.name.trim().is_empty() {
        return Err(AppError::validation("Name and price are required"));
    }
    let price_cents = money::validate_price(data.price)?;

    let category: Option<i64> = sqlx::query_scalar("SELECT id FROM category WHERE id = ?")
        .bind(data.category_id)
        .fetch_optional(pool)
        .await?;
    if category.is_none() {
        return Err(AppError::not_found(format!(
            "Category {} not found",
            data.category_id
        )));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO menu_item (name, description, price_cents, category_id, is_available, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(data.description.unwrap_or_default())
    .bind(price_cents)
    .bind(data.category_id)
    .bind(data.is_available.unwrap_or(true))
    .bind(now_millis())
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::database("Failed to create menu item"))
}

pub async fn update(pool: &SqlitePool, id: i64, data: MenuItemUpdate) -> AppResult<MenuItem> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Menu item {id} not found")))?;

    let price_cents = match data.price {
        Some(p) => Some(money::validate_price(p)?),
        None => None,
    };

    if let Some(category_id) = data.category_id {
        let category: Option<i64> = sqlx::query_scalar("SELECT id FROM category WHERE id = ?")
            .bind(category_id)
            .fetch_optional(pool)
            .await?;
        if category.is_none() {
            return Err(AppError::not_found(format!("Category {category_id} not found")));
        }
    }

    sqlx::query(
        "UPDATE menu_item SET name = COALESCE(?1, name), description = COALESCE(?2, description), \
         price_cents = COALESCE(?3, price_cents), category_id = COALESCE(?4, category_id), \
         is_available = COALESCE(?5, is_available) WHERE id = ?6",
    )
    .bind(data.name)
    .bind(data.description)
    .bind(price_cents)
    .bind(data.category_id)
    .bind(data.is_available)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Menu item {id} not found")))
}

/// Delete a menu item; rejected once any order line references it
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Menu item {id} not found")))?;

    let referenced: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM order_item WHERE menu_item_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if referenced > 0 {
        return Err(AppError::conflict(
            "Cannot delete a menu item referenced by order lines",
        ));
    }

    sqlx::query("DELETE FROM menu_item WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
