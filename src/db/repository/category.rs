//! Category Repository

use sqlx::SqlitePool;

use crate::db::models::{Category, CategoryCreate, CategoryUpdate};
use crate::error::{AppError, AppResult};
use crate::utils::now_millis;

const COLUMNS: &str = "id, name, description, created_at";

pub async fn find_all(pool: &SqlitePool) -> AppResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM category ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Category>> {
    let category =
        sqlx::query_as::<_, Category>(&format!("SELECT {COLUMNS} FROM category WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(category)
}

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> AppResult<Category> {
    if data.name.trim().is_empty() {
        return Err(AppError::validation("Category name is required"));
    }

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM category WHERE name = ?")
        .bind(&data.name)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::conflict(format!(
            "Category '{}' already exists",
            data.name
        )));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO category (name, description, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(data.description.unwrap_or_default())
    .bind(now_millis())
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::database("Failed to create category"))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CategoryUpdate) -> AppResult<Category> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;

    if let Some(name) = &data.name
        && *name != existing.name
    {
        let dup: Option<i64> = sqlx::query_scalar("SELECT id FROM category WHERE name = ? AND id != ?")
            .bind(name)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        if dup.is_some() {
            return Err(AppError::conflict(format!("Category '{name}' already exists")));
        }
    }

    sqlx::query("UPDATE category SET name = COALESCE(?1, name), description = COALESCE(?2, description) WHERE id = ?3")
        .bind(data.name)
        .bind(data.description)
        .bind(id)
        .execute(pool)
        .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))
}

/// Delete a category; rejected while menu items still reference it
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;

    let item_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM menu_item WHERE category_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if item_count > 0 {
        return Err(AppError::conflict(
            "Cannot delete category with menu items",
        ));
    }

    sqlx::query("DELETE FROM category WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
