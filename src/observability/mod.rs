//! 可观测性：tracing 订阅器初始化
//!
//! 默认 `savehub=info`，`RUST_LOG` 可覆盖。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "savehub=info";

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    // 测试或嵌入场景下可能已有全局订阅器，忽略重复初始化
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
