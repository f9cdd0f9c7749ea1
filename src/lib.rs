//! DineSync - 餐厅订单与桌台状态引擎
//!
//! Order lifecycle and table-occupancy consistency engine for a restaurant
//! floor. HTTP/CLI glue lives outside this crate: it calls the operations
//! below with validated primitives and renders the returned snapshots.
//!
//! # 模块结构
//!
//! ```text
//! src/
//! ├── config.rs      # 环境变量配置
//! ├── error.rs       # 统一错误类型
//! ├── db/            # SQLite 连接池、模型、CRUD 仓库
//! ├── orders/        # 订单状态机、金额计算、生命周期引擎
//! ├── reports/       # 只读统计视图
//! └── utils/         # 时间工具、日志
//! ```
//!
//! # Invariant
//!
//! A table is OCCUPIED exactly while at least one non-paid order references
//! it. The order engine is the only code that recomputes this, at the two
//! trigger points (paid transition, cancellation), inside the mutation's own
//! transaction.

pub mod config;
pub mod db;
pub mod error;
pub mod orders;
pub mod reports;
pub mod utils;

// Re-export 公共类型
pub use config::Config;
pub use db::DbService;
pub use db::models::{
    Category, DiningTable, MenuItem, Order, OrderCreate, OrderDetail, OrderFilter, OrderItemInput,
    OrderStatus, OrderUpdate, TableStatus,
};
pub use error::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// 设置环境 (dotenv, 日志)，返回加载的配置
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    config
}
