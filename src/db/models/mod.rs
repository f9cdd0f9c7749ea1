//! Database models
//!
//! Entity structs mapped 1:1 to the schema plus their Create/Update payloads.
//! Monetary columns are integer cents; [`rust_decimal::Decimal`] values appear
//! only at the API boundary (details, reports).

pub mod category;
pub mod dining_table;
pub mod menu_item;
pub mod order;

pub use category::{Category, CategoryCreate, CategoryUpdate};
pub use dining_table::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus};
pub use menu_item::{MenuItem, MenuItemCreate, MenuItemUpdate};
pub use order::{
    Order, OrderCreate, OrderDetail, OrderFilter, OrderItem, OrderItemDetail, OrderItemInput,
    OrderStatus, OrderUpdate,
};
