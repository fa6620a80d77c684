//! Action 分发器
//!
//! 持有声明表、会话存储与文档引擎。dispatch(envelope) 依次：查 Action → 校验会话 →
//! 取文档 → 按声明转换参数 → 在阻塞线程池中调用 handler → 包装响应。
//! 任何失败都转为 `{"error": ...}`；每次调用输出结构化审计日志（JSON）。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;

use super::message::{RequestEnvelope, ResponseEnvelope};
use super::session_store::SessionStore;
use crate::core::error::RpcError;
use crate::engine::DocumentEngine;
use crate::registry::{ActionRegistry, Arguments, HandlerKind};

/// Action 分发器；连接之间共享
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
    sessions: Arc<dyn SessionStore>,
    engine: Arc<dyn DocumentEngine>,
    /// None 表示不限时
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ActionRegistry>,
        sessions: Arc<dyn SessionStore>,
        engine: Arc<dyn DocumentEngine>,
    ) -> Self {
        Self {
            registry,
            sessions,
            engine,
            timeout: None,
        }
    }

    /// 单次请求超时；0 表示关闭
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// 处理一条原始文本消息
    pub async fn dispatch_text(&self, text: &str) -> ResponseEnvelope {
        match RequestEnvelope::parse(text) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                audit("", None, &Err(e.clone()), Duration::ZERO);
                ResponseEnvelope::error(&e)
            }
        }
    }

    pub async fn dispatch(&self, request: RequestEnvelope) -> ResponseEnvelope {
        let start = Instant::now();
        let action = request.action.clone().unwrap_or_default();
        let session = request.session_id.clone();

        let result = self.route(request).await;
        audit(&action, session.as_deref(), &result, start.elapsed());

        match result {
            Ok(payload) => ResponseEnvelope::success(payload),
            Err(e) => ResponseEnvelope::error(&e),
        }
    }

    async fn route(&self, request: RequestEnvelope) -> Result<Value, RpcError> {
        let entry = request
            .action
            .as_deref()
            .and_then(|name| self.registry.get(name))
            .ok_or(RpcError::UnknownAction)?;
        let descriptor = &entry.descriptor;
        let deadline = self.timeout.map(|limit| Instant::now() + limit);

        // 只有需要会话的 Action 才解析 sessionId
        let session = if descriptor.requires_session {
            let id = request.session_id.ok_or(RpcError::SessionRequired)?;
            let document = self
                .sessions
                .get(&id)
                .await
                .ok_or_else(|| RpcError::SessionNotFound(id.clone()))?;
            Some((id, document))
        } else {
            None
        };

        let args = Arguments::coerce(&descriptor.params, &request.arguments)?;

        match entry.handler {
            HandlerKind::Document(handler) => {
                let (_, document) = session.ok_or(RpcError::SessionRequired)?;
                let mut guard = self.within(deadline, document.lock_owned()).await?;
                self.run_blocking(deadline, move || handler(&mut **guard, &args))
                    .await
            }
            HandlerKind::Knowledge(handler) => {
                let engine = Arc::clone(&self.engine);
                self.run_blocking(deadline, move || handler(engine.game_data(), &args))
                    .await
            }
            HandlerKind::CreateSession(handler) => {
                let engine = Arc::clone(&self.engine);
                let (document, payload) = self
                    .run_blocking(deadline, move || handler(engine.as_ref(), &args))
                    .await?;
                let session_id = self.sessions.create(document).await;
                tracing::info!(session = %short(&session_id), "session created");

                let mut payload = match payload {
                    Value::Object(map) => map,
                    other => {
                        let mut map = serde_json::Map::new();
                        map.insert("result".to_string(), other);
                        map
                    }
                };
                payload.insert("sessionId".to_string(), Value::String(session_id));
                Ok(Value::Object(payload))
            }
            HandlerKind::ListSessions => {
                let ids = self.sessions.list_ids().await;
                Ok(json!({ "sessionIds": ids, "count": ids.len() }))
            }
            HandlerKind::DestroySession => {
                let (id, _) = session.ok_or(RpcError::SessionRequired)?;
                if !self.sessions.remove(&id).await {
                    return Err(RpcError::SessionNotFound(id));
                }
                tracing::info!(session = %short(&id), "session unloaded");
                Ok(json!({
                    "success": true,
                    "message": format!("Session {} unloaded", id),
                }))
            }
        }
    }

    async fn within<F: Future>(&self, deadline: Option<Instant>, fut: F) -> Result<F::Output, RpcError> {
        match deadline {
            Some(at) => tokio::time::timeout_at(at, fut)
                .await
                .map_err(|_| RpcError::Timeout(self.timeout.map_or(0, |t| t.as_secs()))),
            None => Ok(fut.await),
        }
    }

    /// handler 是同步 CPU 工作（可能含阻塞 I/O），放到阻塞线程池，不占用连接任务
    async fn run_blocking<T, F>(&self, deadline: Option<Instant>, work: F) -> Result<T, RpcError>
    where
        F: FnOnce() -> Result<T, RpcError> + Send + 'static,
        T: Send + 'static,
    {
        let task = tokio::task::spawn_blocking(work);
        match self.within(deadline, task).await? {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("handler task failed: {}", e);
                Err(RpcError::Internal(e.to_string()))
            }
        }
    }
}

/// 会话 id 只记前 8 位
fn short(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}

fn audit(action: &str, session: Option<&str>, result: &Result<Value, RpcError>, elapsed: Duration) {
    let (ok, outcome, kind) = match result {
        Ok(_) => (true, "ok", None),
        Err(RpcError::Timeout(_)) => (false, "timeout", Some("timeout")),
        Err(e) => (false, "error", Some(e.kind())),
    };
    let audit = json!({
        "event": "action_audit",
        "action": action,
        "ok": ok,
        "outcome": outcome,
        "error_kind": kind,
        "duration_ms": elapsed.as_millis() as u64,
        "session": session.map(short),
    });
    tracing::info!(audit = %audit, "action");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SnapshotEngine;
    use crate::gateway::session_store::MemorySessionStore;
    use crate::handlers::{encode_base64, testing};
    use crate::registry::{ActionCategory, ActionDescriptor};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            Arc::new(ActionRegistry::builtin().unwrap()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(SnapshotEngine::new()),
        )
    }

    fn save_data() -> String {
        encode_base64(&serde_json::to_vec(&testing::snapshot()).unwrap())
    }

    async fn load(dispatcher: &Dispatcher) -> String {
        let response = dispatcher
            .dispatch(RequestEnvelope::new("loadSave").with_arg("data", save_data()))
            .await
            .into_value();
        response["sessionId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_unknown_action_regardless_of_session() {
        let dispatcher = dispatcher();
        for request in [
            RequestEnvelope::new("doesNotExist"),
            RequestEnvelope::new("doesNotExist").with_session("abc"),
            RequestEnvelope::default(),
        ] {
            let response = dispatcher.dispatch(request).await;
            assert_eq!(response.error_message(), Some("Unknown action"));
        }
    }

    #[tokio::test]
    async fn test_session_checks() {
        let dispatcher = dispatcher();
        let response = dispatcher.dispatch(RequestEnvelope::new("getBoxNames")).await;
        assert_eq!(response.error_message(), Some("sessionId is required for this action"));

        let response = dispatcher
            .dispatch(RequestEnvelope::new("unloadSession").with_session("bogus"))
            .await;
        assert_eq!(response.into_value(), json!({ "error": "Session ID 'bogus' not found" }));
    }

    #[tokio::test]
    async fn test_session_ignored_when_not_required() {
        let dispatcher = dispatcher();
        let response = dispatcher
            .dispatch(RequestEnvelope::new("getSpeciesName").with_session("bogus").with_arg("species", 25))
            .await;
        assert_eq!(response.into_value(), json!({ "id": 25, "name": "Pikachu" }));
    }

    #[tokio::test]
    async fn test_load_injects_session_id_and_keeps_fields() {
        let dispatcher = dispatcher();
        let response = dispatcher
            .dispatch(RequestEnvelope::new("loadSave").with_arg("data", save_data()))
            .await
            .into_value();
        assert_eq!(response["success"], json!(true));
        assert_eq!(response["trainerName"], json!("HILDA"));
        assert!(response["sessionId"].is_string());
    }

    #[tokio::test]
    async fn test_identical_loads_get_distinct_sessions() {
        let dispatcher = dispatcher();
        let first = load(&dispatcher).await;
        let second = load(&dispatcher).await;
        assert_ne!(first, second);

        let listed = dispatcher.dispatch(RequestEnvelope::new("listSessions")).await.into_value();
        assert_eq!(listed["count"], json!(2));
    }

    #[tokio::test]
    async fn test_list_sessions_empty() {
        let dispatcher = dispatcher();
        let response = dispatcher.dispatch_text(r#"{"action":"listSessions"}"#).await;
        assert_eq!(response.to_text(), r#"{"sessionIds":[],"count":0}"#);
    }

    #[tokio::test]
    async fn test_parameter_errors_are_local() {
        let dispatcher = dispatcher();
        let id = load(&dispatcher).await;

        let missing = dispatcher
            .dispatch(RequestEnvelope::new("getPokemon").with_session(&id).with_arg("box", 0))
            .await;
        assert_eq!(missing.error_message(), Some("Missing required parameter 'slot'"));

        let wrong_type = dispatcher
            .dispatch(
                RequestEnvelope::new("getPokemon")
                    .with_session(&id)
                    .with_arg("box", "first")
                    .with_arg("slot", 0),
            )
            .await;
        assert_eq!(wrong_type.error_message(), Some("Parameter 'box' must be an integer"));

        // 会话仍然可用
        let ok = dispatcher
            .dispatch(RequestEnvelope::new("getPokemon").with_session(&id).with_arg("box", "0").with_arg("slot", 0))
            .await
            .into_value();
        assert_eq!(ok["species"], json!(495));
    }

    #[tokio::test]
    async fn test_unload_then_use_fails() {
        let dispatcher = dispatcher();
        let id = load(&dispatcher).await;
        let unloaded = dispatcher
            .dispatch(RequestEnvelope::new("unloadSession").with_session(&id))
            .await
            .into_value();
        assert_eq!(unloaded["success"], json!(true));

        let response = dispatcher
            .dispatch(RequestEnvelope::new("getSaveInfo").with_session(&id))
            .await;
        assert_eq!(response.error_message().unwrap(), format!("Session ID '{}' not found", id));
    }

    #[tokio::test]
    async fn test_malformed_text() {
        let dispatcher = dispatcher();
        let response = dispatcher.dispatch_text("{not json").await;
        assert!(response.error_message().unwrap().starts_with("Malformed request"));
    }

    fn panicking(_: &mut dyn crate::engine::Document, _: &Arguments) -> Result<Value, RpcError> {
        panic!("engine bug")
    }

    fn sleepy(_: &mut dyn crate::engine::Document, _: &Arguments) -> Result<Value, RpcError> {
        std::thread::sleep(Duration::from_millis(1500));
        Ok(json!({}))
    }

    async fn custom(entries: Vec<crate::registry::ActionEntry>, timeout_secs: u64) -> (Dispatcher, String) {
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let id = sessions.create(testing::document()).await;
        let dispatcher = Dispatcher::new(
            Arc::new(ActionRegistry::from_entries(entries).unwrap()),
            sessions,
            Arc::new(SnapshotEngine::new()),
        )
        .with_timeout(timeout_secs);
        (dispatcher, id)
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let (dispatcher, id) = custom(
            vec![ActionDescriptor::new("explode", ActionCategory::Save, "").document(panicking)],
            0,
        )
        .await;
        let response = dispatcher.dispatch(RequestEnvelope::new("explode").with_session(&id)).await;
        assert_eq!(response.error_message(), Some("Failed to process request"));

        // 文档锁已释放，后续请求不受影响
        let again = dispatcher.dispatch(RequestEnvelope::new("explode").with_session(&id)).await;
        assert!(again.is_error());
    }

    #[tokio::test]
    async fn test_timeout() {
        let (dispatcher, id) = custom(
            vec![ActionDescriptor::new("slow", ActionCategory::Save, "").document(sleepy)],
            1,
        )
        .await;
        let response = dispatcher.dispatch(RequestEnvelope::new("slow").with_session(&id)).await;
        assert_eq!(response.error_message(), Some("Request timed out after 1s"));
    }
}
