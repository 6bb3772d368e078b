use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkers_server::{router, ServerConfig, ServerState};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("checkers_server=debug".parse()?))
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.addr();
    let state = Arc::new(ServerState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听 {}", addr))?;
    info!("跳棋服务端启动，监听 {}", addr);

    axum::serve(listener, router(state))
        .await
        .context("服务器异常退出")?;

    Ok(())
}
