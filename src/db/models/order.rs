//! Order Model
//!
//! Order rows, order lines, the status state machine and the materialized
//! detail views returned by the engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::orders::money;

/// Order lifecycle status
///
/// ```text
/// PENDING -> PREPARING -> READY -> SERVED -> PAID
///    └──────────────────────────────────────┘  (shortcut: direct settle)
/// ```
///
/// `PAID` is terminal. The transition table is static; same-status updates
/// are not in any allowed set and are rejected like any other bad transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Served,
    Paid,
}

impl OrderStatus {
    /// Allowed next states for this status
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Preparing, OrderStatus::Paid],
            OrderStatus::Preparing => &[OrderStatus::Ready],
            OrderStatus::Ready => &[OrderStatus::Served],
            OrderStatus::Served => &[OrderStatus::Paid],
            OrderStatus::Paid => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Served => "SERVED",
            OrderStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order row as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub table_id: i64,
    pub status: OrderStatus,
    pub total_cents: i64,
    #[serde(default)]
    pub notes: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line row as stored
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
    /// Menu price captured at line creation, never re-read from the catalog
    pub price_cents: i64,
    #[serde(default)]
    pub notes: String,
}

// ========== Engine payloads ==========

/// One requested order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub table_id: i64,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Update order payload: status transition and/or notes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// List filter for `list_orders`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<i64>,
}

// ========== Materialized views ==========

/// Order line with catalog name and computed subtotal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemDetail {
    pub id: i64,
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub notes: String,
}

/// Fully materialized order as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: i64,
    pub table_id: i64,
    pub table_number: i64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub notes: String,
    pub items: Vec<OrderItemDetail>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn total_amount(&self) -> Decimal {
        money::from_cents(self.total_cents)
    }
}
