#![allow(dead_code)]

//! Shared test fixture: in-memory database seeded with a small menu and two
//! tables.

use rust_decimal::Decimal;
use sqlx::SqlitePool;

use dinesync::DbService;
use dinesync::db::models::{
    Category, CategoryCreate, DiningTable, DiningTableCreate, MenuItem, MenuItemCreate,
    OrderItemInput, TableStatus,
};
use dinesync::db::repository::{category, dining_table, menu_item};

pub struct Fixture {
    pub db: DbService,
    pub mains: Category,
    /// 6.99, available
    pub burger: MenuItem,
    /// 4.99, available
    pub salad: MenuItem,
    /// 12.50, unavailable
    pub oyster: MenuItem,
    pub t1: DiningTable,
    pub t2: DiningTable,
}

impl Fixture {
    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}

pub async fn setup() -> Fixture {
    let db = DbService::in_memory().await.expect("in-memory db");

    let mains = category::create(
        &db.pool,
        CategoryCreate {
            name: "Mains".into(),
            description: None,
        },
    )
    .await
    .expect("seed category");

    let burger = seed_item(&db.pool, "Burger", "6.99", mains.id, true).await;
    let salad = seed_item(&db.pool, "Salad", "4.99", mains.id, true).await;
    let oyster = seed_item(&db.pool, "Oyster", "12.50", mains.id, false).await;

    let t1 = dining_table::create(
        &db.pool,
        DiningTableCreate {
            number: 1,
            capacity: Some(4),
        },
    )
    .await
    .expect("seed table 1");
    let t2 = dining_table::create(
        &db.pool,
        DiningTableCreate {
            number: 2,
            capacity: Some(2),
        },
    )
    .await
    .expect("seed table 2");

    Fixture {
        db,
        mains,
        burger,
        salad,
        oyster,
        t1,
        t2,
    }
}

async fn seed_item(
    pool: &SqlitePool,
    name: &str,
    price: &str,
    category_id: i64,
    available: bool,
) -> MenuItem {
    menu_item::create(
        pool,
        MenuItemCreate {
            name: name.into(),
            description: None,
            price: dec(price),
            category_id,
            is_available: Some(available),
        },
    )
    .await
    .expect("seed menu item")
}

pub fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

pub fn line(menu_item_id: i64, quantity: i64) -> OrderItemInput {
    OrderItemInput {
        menu_item_id,
        quantity,
        notes: None,
    }
}

pub async fn table_status(pool: &SqlitePool, table_id: i64) -> TableStatus {
    dining_table::find_by_id(pool, table_id)
        .await
        .expect("find table")
        .expect("table exists")
        .status
}

pub async fn order_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await
        .expect("count orders")
}

pub async fn order_item_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM order_item")
        .fetch_one(pool)
        .await
        .expect("count order items")
}
