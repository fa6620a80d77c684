//! SaveHub - 存档文档 WebSocket 网关
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、优雅关闭
//! - **engine**: 文档引擎接口与内置快照引擎
//! - **registry**: Action 声明表、参数转换
//! - **handlers**: 各分类 Action 的实现
//! - **schema**: AsyncAPI 协议描述
//! - **docs**: HTML 协议文档
//! - **gateway**: WebSocket 网关（Hub、连接循环、分发器、会话存储）
//! - **observability**: tracing 初始化

pub mod config;
pub mod core;
pub mod docs;
pub mod engine;
pub mod gateway;
pub mod handlers;
pub mod observability;
pub mod registry;
pub mod schema;

pub use gateway::{Dispatcher, Hub, HubConfig};
pub use registry::ActionRegistry;
