//! 服务层 - 服务器核心服务
//!
//! # 服务列表
//!
//! - [`InventoryService`] - 进货登记与库存查询
//! - [`HttpService`] - HTTP 服务器

pub mod http;
pub mod inventory;

pub use http::HttpService;
pub use inventory::{InventoryError, InventoryResult, InventoryService, SupplyReceipt};
