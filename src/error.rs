//! 统一错误处理
//!
//! Single application-level error enum consumed by repositories, the order
//! engine and reporting. Callers (HTTP glue, CLI, …) translate these kinds
//! to their own surface; nothing here knows about status codes.

use crate::db::models::OrderStatus;

/// Application error enum
///
/// | Variant | Meaning |
/// |---------|---------|
/// | `NotFound` | referenced table/order/menu-item id does not exist |
/// | `Validation` | malformed or missing input (non-positive quantity, empty items, …) |
/// | `Conflict` | business-rule violation (duplicate number, unavailable item, …) |
/// | `InvalidTransition` | order status transition not in the allowed table |
/// | `Database` | storage failure, no business meaning |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid status transition: {from} -> {to} ({})", allowed_text(.allowed))]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        allowed: Vec<OrderStatus>,
    },

    #[error("Database error: {0}")]
    Database(String),
}

fn allowed_text(allowed: &[OrderStatus]) -> String {
    if allowed.is_empty() {
        "terminal state".to_string()
    } else {
        format!(
            "allowed: {}",
            allowed
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

/// Application-level Result type
pub type AppResult<T> = Result<T, AppError>;
