//! Hub：HTTP 监听与 WebSocket 升级
//!
//! 根路径 `/`：
//! - WebSocket 升级请求 → 交给 connection 循环
//! - GET → HTML 协议文档
//! - OPTIONS → AsyncAPI Schema（JSON）
//! - 其他 → 400 `WebSocket connections only`
//!
//! `/health` 返回 `OK`。Schema 与文档在启动时生成一次，之后只读。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::protocol::{Role, WebSocketConfig};
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

use super::connection::{serve_connection, ConnectionSettings};
use super::dispatcher::Dispatcher;
use crate::config::{ApiSection, ServerSection};

/// Hub 配置
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub bind_addr: String,
    pub max_frame_bytes: usize,
    pub max_message_bytes: usize,
    pub keepalive_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::from(&ServerSection::default())
    }
}

impl From<&ServerSection> for HubConfig {
    fn from(server: &ServerSection) -> Self {
        Self {
            bind_addr: server.bind_addr.clone(),
            max_frame_bytes: server.max_frame_bytes,
            max_message_bytes: server.max_message_bytes,
            keepalive_secs: server.keepalive_secs,
        }
    }
}

impl HubConfig {
    fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            max_frame_bytes: self.max_frame_bytes,
            keepalive: (self.keepalive_secs > 0).then(|| Duration::from_secs(self.keepalive_secs)),
        }
    }

    fn websocket_config(&self) -> WebSocketConfig {
        WebSocketConfig {
            max_message_size: Some(self.max_message_bytes),
            max_frame_size: Some(self.max_message_bytes),
            ..WebSocketConfig::default()
        }
    }
}

struct HubState {
    dispatcher: Arc<Dispatcher>,
    schema: String,
    docs: String,
    config: HubConfig,
    shutdown: CancellationToken,
}

/// Hub（轮毂/中枢）
pub struct Hub {
    state: Arc<HubState>,
}

impl Hub {
    pub fn new(
        config: HubConfig,
        api: &ApiSection,
        dispatcher: Arc<Dispatcher>,
        shutdown: CancellationToken,
    ) -> Self {
        let schema = crate::schema::project(dispatcher.registry(), api);
        let docs = crate::docs::render(&schema);
        Self {
            state: Arc::new(HubState {
                dispatcher,
                schema: crate::schema::to_pretty(&schema),
                docs,
                config,
                shutdown,
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", any(root))
            .route("/health", get(health))
            .with_state(Arc::clone(&self.state))
    }

    /// 按配置地址绑定
    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        let addr: SocketAddr = self
            .state
            .config
            .bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", self.state.config.bind_addr, e))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
        Ok(listener)
    }

    /// 在给定监听器上服务，直到关闭信号触发
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!("Gateway listening on ws://{}", addr);

        let shutdown = self.state.shutdown.clone();
        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// 绑定并服务
    pub async fn start(self) -> anyhow::Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }
}

async fn root(State(state): State<Arc<HubState>>, request: Request) -> Response {
    if is_websocket_upgrade(request.method(), request.headers()) {
        return upgrade(state, request);
    }

    match *request.method() {
        Method::GET => Html(state.docs.clone()).into_response(),
        Method::OPTIONS => (
            [(header::CONTENT_TYPE, "application/json")],
            state.schema.clone(),
        )
            .into_response(),
        _ => (StatusCode::BAD_REQUEST, "WebSocket connections only").into_response(),
    }
}

async fn health() -> &'static str {
    "OK"
}

fn is_websocket_upgrade(method: &Method, headers: &HeaderMap) -> bool {
    let contains = |name: header::HeaderName, token: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').any(|part| part.trim().eq_ignore_ascii_case(token)))
            .unwrap_or(false)
    };
    method == Method::GET && contains(header::UPGRADE, "websocket") && contains(header::CONNECTION, "upgrade")
}

fn upgrade(state: Arc<HubState>, mut request: Request) -> Response {
    let Some(key) = request.headers().get(header::SEC_WEBSOCKET_KEY).cloned() else {
        return (StatusCode::BAD_REQUEST, "Missing Sec-WebSocket-Key").into_response();
    };
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let on_upgrade = hyper::upgrade::on(&mut request);
    tokio::spawn(async move {
        match on_upgrade.await {
            Ok(upgraded) => {
                let ws = WebSocketStream::from_raw_socket(
                    TokioIo::new(upgraded),
                    Role::Server,
                    Some(state.config.websocket_config()),
                )
                .await;
                serve_connection(
                    ws,
                    peer,
                    Arc::clone(&state.dispatcher),
                    state.config.connection_settings(),
                    state.shutdown.clone(),
                )
                .await;
            }
            Err(e) => tracing::warn!("WebSocket upgrade failed for {}: {}", peer, e),
        }
    });

    axum::http::Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .header(header::CONNECTION, "upgrade")
        .header(header::UPGRADE, "websocket")
        .header(header::SEC_WEBSOCKET_ACCEPT, derive_accept_key(key.as_bytes()))
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SnapshotEngine;
    use crate::gateway::session_store::create_session_store;
    use crate::registry::ActionRegistry;
    use tower::ServiceExt;

    fn hub() -> Hub {
        let dispatcher = Dispatcher::new(
            Arc::new(ActionRegistry::builtin().unwrap()),
            create_session_store(),
            Arc::new(SnapshotEngine::new()),
        );
        Hub::new(
            HubConfig::default(),
            &ApiSection::default(),
            Arc::new(dispatcher),
            CancellationToken::new(),
        )
    }

    async fn call(method: Method, uri: &str) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = hub().router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_get_root_serves_docs() {
        let (status, body) = call(Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<html"));
        assert!(body.contains("loadSave"));
    }

    #[tokio::test]
    async fn test_options_root_serves_schema() {
        let (status, body) = call(Method::OPTIONS, "/").await;
        assert_eq!(status, StatusCode::OK);
        let schema: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(schema["info"]["title"], "SaveHub WebSocket API");
        assert!(schema["components"]["messages"]["getPokemon"].is_object());
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let (status, body) = call(Method::POST, "/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "WebSocket connections only");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[test]
    fn test_upgrade_detection() {
        let mut headers = HeaderMap::new();
        headers.insert(header::UPGRADE, "WebSocket".parse().unwrap());
        headers.insert(header::CONNECTION, "keep-alive, Upgrade".parse().unwrap());
        assert!(is_websocket_upgrade(&Method::GET, &headers));
        assert!(!is_websocket_upgrade(&Method::POST, &headers));
        assert!(!is_websocket_upgrade(&Method::GET, &HeaderMap::new()));
    }
}
