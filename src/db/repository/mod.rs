//! Repository Module
//!
//! Pool-based CRUD for the reference entities (catalog, dining tables).
//! Order mutations never live here — they go through the order engine so the
//! derived table status keeps a single writer.

pub mod category;
pub mod dining_table;
pub mod menu_item;
