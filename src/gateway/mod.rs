//! 网关：会话化的 Action RPC over WebSocket
//!
//! - **hub**：HTTP 监听、WebSocket 升级、文档 / Schema / 健康检查路由
//! - **connection**：单连接一问一答循环，出站分片、心跳、关闭
//! - **dispatcher**：信封 → Action 声明 → 会话 → 参数转换 → handler
//! - **session_store**：会话 id → 文档句柄
//! - **message**：请求 / 响应信封

mod connection;
mod dispatcher;
mod hub;
mod message;
mod session_store;

pub use connection::{send_chunked, serve_connection, ConnectionEnd, ConnectionSettings};
pub use dispatcher::Dispatcher;
pub use hub::{Hub, HubConfig};
pub use message::{ErrorEnvelope, RequestEnvelope, ResponseEnvelope};
pub(crate) use message::RequestFormat;
pub use session_store::{create_session_store, MemorySessionStore, SessionId, SessionStore, SharedDocument};
