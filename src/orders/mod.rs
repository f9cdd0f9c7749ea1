//! Order lifecycle engine
//!
//! Owns every order mutation and the table-occupancy consistency rule.
//! Nothing else writes `orders`, `order_item` or the derived
//! `dining_table.status` field at lifecycle events.

pub mod engine;
pub mod money;

pub use engine::{
    add_items, cancel_order, create_order, get_order, list_active_orders, list_kitchen_orders,
    list_orders, update_status,
};
