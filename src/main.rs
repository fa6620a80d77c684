//! SaveHub - 存档文档 WebSocket 网关
//!
//! 运行方式：
//! ```bash
//! savehub                    # 等同 savehub serve
//! savehub serve 0.0.0.0:3030 # 覆盖监听地址
//! savehub schema             # 输出 AsyncAPI Schema
//! savehub docs               # 输出 HTML 文档
//! ```
//!
//! `--config <path>` 追加一个配置文件；环境变量 `SAVEHUB__*` 优先级最高。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use savehub::config::{load_config, AppConfig};
use savehub::core::{SessionStoreCleanup, ShutdownCoordinator, ShutdownManager, ShutdownReason};
use savehub::engine::{DocumentEngine, SnapshotEngine};
use savehub::gateway::{create_session_store, Dispatcher, Hub, HubConfig};
use savehub::registry::ActionRegistry;
use savehub::{docs, observability, schema};

/// 存档文档 WebSocket 网关
#[derive(Parser, Debug)]
#[command(name = "savehub", version)]
struct Cli {
    /// 追加的配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 启动网关（默认）
    Serve {
        /// 覆盖监听地址，例如 0.0.0.0:3030
        addr: Option<String>,
    },
    /// 输出 AsyncAPI Schema
    Schema,
    /// 输出 HTML 文档
    Docs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cli = Cli::parse();
    let config: AppConfig = load_config(cli.config).context("Failed to load config")?;
    // 声明表有误时直接拒绝启动
    let registry = Arc::new(ActionRegistry::builtin().context("Invalid action registry")?);

    match cli.command.unwrap_or(Command::Serve { addr: None }) {
        Command::Schema => {
            println!("{}", schema::to_pretty(&schema::project(&registry, &config.api)));
            Ok(())
        }
        Command::Docs => {
            println!("{}", docs::render(&schema::project(&registry, &config.api)));
            Ok(())
        }
        Command::Serve { addr } => serve(config, registry, addr).await,
    }
}

async fn serve(config: AppConfig, registry: Arc<ActionRegistry>, addr: Option<String>) -> anyhow::Result<()> {
    let mut hub_config = HubConfig::from(&config.server);
    if let Some(addr) = addr {
        hub_config.bind_addr = addr;
    }

    let sessions = create_session_store();
    let engine = Arc::new(SnapshotEngine::new());
    tracing::info!("Loaded {} actions, document engine: {}", registry.len(), engine.name());

    let dispatcher = Dispatcher::new(registry, Arc::clone(&sessions), engine)
        .with_timeout(config.server.request_timeout_secs);

    let manager = Arc::new(ShutdownManager::new());
    manager.install_signal_handlers();
    let mut coordinator = ShutdownCoordinator::new(Arc::clone(&manager));
    coordinator.register(SessionStoreCleanup::new(sessions));

    let hub = Hub::new(hub_config, &config.api, Arc::new(dispatcher), manager.token());
    let listener = hub.bind().await?;
    tracing::info!("Press Ctrl+C to stop");

    if let Err(e) = hub.serve(listener).await {
        tracing::error!("Gateway failed: {}", e);
        manager.shutdown(ShutdownReason::FatalError(e.to_string()));
    }

    coordinator.run_cleanup().await;
    Ok(())
}
