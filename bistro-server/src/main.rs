use bistro_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载 .env 和配置
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // 2. 设置环境 (工作目录, 日志)
    let _log_guard = setup_environment(&config)?;

    // 打印横幅
    print_banner();

    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        "🍝 Bistro Server starting..."
    );

    // 3. 初始化服务器状态 (数据库、目录数据)
    let state = ServerState::initialize(&config)?;

    // 4. 启动 HTTP 服务器 (Server::run 会启动后台任务)
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
