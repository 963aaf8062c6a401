use std::sync::Arc;

use tokio::sync::broadcast;

use crate::core::{Config, Result};
use crate::orders::{EventPayload, OrderEvent, OrdersManager, RedbBackend};
use crate::services::InventoryService;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 克隆开销很小（内部全是 `Arc`），可直接作为 axum 的 State。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | `Config` | 服务器配置 |
/// | orders | `Arc<OrdersManager>` | 订单生命周期引擎 |
/// | inventory | `Arc<InventoryService>` | 进货与库存查询 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub orders: Arc<OrdersManager<RedbBackend>>,
    pub inventory: Arc<InventoryService<RedbBackend>>,
}

impl ServerState {
    /// 基于已打开的存储后端构造状态
    ///
    /// 测试中配合 [`RedbBackend::open_in_memory`] 使用
    pub fn new(config: Config, backend: RedbBackend) -> Self {
        let orders = OrdersManager::with_options(
            backend.clone(),
            config.event_channel_capacity,
            config.order_txn_max_retries,
        );
        let inventory = InventoryService::with_max_retries(backend, config.order_txn_max_retries);
        Self {
            config,
            orders: Arc::new(orders),
            inventory: Arc::new(inventory),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录 (确保目录存在)
    /// 2. 数据库 (work_dir/DB_FILE)
    /// 3. 目录数据导入 (仅当设置了 SEED_FILE 且数据库为空)
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        let db_path = config.db_path();
        let backend = RedbBackend::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database opened");

        if let Some(seed_file) = &config.seed_file {
            crate::seed::load_seed_file(&backend, seed_file)?;
        }

        Ok(Self::new(config.clone(), backend))
    }

    /// 启动后台任务
    ///
    /// 必须在 tokio 运行时内调用
    ///
    /// 启动的任务：
    /// - 订单事件日志 (订阅引擎广播)
    pub fn start_background_tasks(&self) {
        let rx = self.orders.subscribe();
        tokio::spawn(log_order_events(rx));
    }
}

/// 订阅订单事件并写入日志（阻塞直到通道关闭）
async fn log_order_events(mut rx: broadcast::Receiver<OrderEvent>) {
    tracing::debug!("Order event logger started");

    loop {
        match rx.recv().await {
            Ok(event) => log_event(&event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Order event logger lagged, events skipped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("Order event channel closed, logger stopping");
                break;
            }
        }
    }
}

fn log_event(event: &OrderEvent) {
    match &event.payload {
        EventPayload::OrderCreated {
            table_id,
            waiter_id,
            total,
            item_count,
            consumed,
        } => tracing::info!(
            target: "order_events",
            order_id = event.order_id,
            table_id,
            waiter_id,
            %total,
            item_count,
            ingredients = consumed.len(),
            "Order created"
        ),
        EventPayload::StatusChanged {
            from,
            to,
            table_freed,
        } => tracing::info!(
            target: "order_events",
            order_id = event.order_id,
            %from,
            %to,
            table_freed = ?table_freed,
            "Order status changed"
        ),
        EventPayload::OrderClosed { table_id, total } => tracing::info!(
            target: "order_events",
            order_id = event.order_id,
            table_id,
            %total,
            "Order closed"
        ),
        EventPayload::OrderDeleted { table_id, restored } => tracing::info!(
            target: "order_events",
            order_id = event.order_id,
            table_id,
            ingredients = restored.len(),
            "Order deleted, stock restored"
        ),
    }
}
