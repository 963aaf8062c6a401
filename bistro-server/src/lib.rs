//! Bistro Server - 餐厅后台：订单生命周期与库存消耗
//!
//! # 架构概述
//!
//! - **订单引擎** (`orders`): 下单扣库存、状态流转、结账、撤单，全部单事务完成
//! - **存储** (`orders/storage`): 嵌入式 redb
//! - **库存服务** (`services/inventory`): 进货登记与低库存查询
//! - **认证** (`auth`): 网关转发身份 + 角色权限
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! bistro-server/src/
//! ├── core/          # 配置、状态、错误
//! ├── auth/          # 身份解析、权限
//! ├── services/      # 库存服务、HTTP 服务
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 日志、校验
//! ├── orders/        # 订单生命周期引擎与存储
//! └── seed.rs        # 目录数据导入
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod orders;
pub mod seed;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, Role};
pub use crate::core::{Config, Server, ServerError, ServerState};
pub use orders::{OpContext, OrdersManager, RedbBackend};
pub use services::{HttpService, InventoryService};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境：工作目录、日志
///
/// 返回的 guard 需要在进程生命周期内持有（文件日志落盘）
pub fn setup_environment(
    config: &Config,
) -> crate::core::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    std::fs::create_dir_all(&config.work_dir)?;

    let guard = init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
    api::health::mark_started();
    Ok(guard)
}

pub fn print_banner() {
    println!(
        r#"
    ____  _      __
   / __ )(_)____/ /__________
  / __  / / ___/ __/ ___/ __ \
 / /_/ / (__  ) /_/ /  / /_/ /
/_____/_/____/\__/_/   \____/
    "#
    );
}
