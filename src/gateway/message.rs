//! 网关消息协议定义
//!
//! 请求：JSON 对象，`action` 必填，`sessionId` 可选，其余顶层字段均为参数（无嵌套 params）。
//! 响应：要么是 Action 的成功载荷（对象），要么是 `{"error": "..."}`，二者必居其一。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::RpcError;

/// 已拆分的请求信封
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestEnvelope {
    /// 缺失或非字符串时为 None（按未知 Action 处理）
    pub action: Option<String>,
    /// 空字符串视为未提供
    pub session_id: Option<String>,
    /// 除 action / sessionId 外的全部顶层字段
    pub arguments: Map<String, Value>,
}

impl RequestEnvelope {
    /// 解析一条文本消息；非 JSON 或非对象为 MalformedRequest
    pub fn parse(text: &str) -> Result<Self, RpcError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RpcError::MalformedRequest(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, RpcError> {
        let Value::Object(mut arguments) = value else {
            return Err(RpcError::MalformedRequest(
                "expected a JSON object".to_string(),
            ));
        };

        let action = match arguments.remove("action") {
            Some(Value::String(name)) => Some(name),
            _ => None,
        };
        let session_id = match arguments.remove("sessionId") {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Self {
            action,
            session_id,
            arguments,
        })
    }

    /// 便于构造测试请求
    pub fn new(action: &str) -> Self {
        Self {
            action: Some(action.to_string()),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_arg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.to_string(), value.into());
        self
    }
}

/// 错误响应 `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorEnvelope {
    /// Error message describing what went wrong
    pub error: String,
}

/// 响应信封
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Error(ErrorEnvelope),
    Success(Map<String, Value>),
}

impl ResponseEnvelope {
    /// 成功载荷；非对象值包装为 `{"result": ...}`
    pub fn success(value: Value) -> Self {
        match value {
            Value::Object(map) => ResponseEnvelope::Success(map),
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                ResponseEnvelope::Success(map)
            }
        }
    }

    pub fn error(err: &RpcError) -> Self {
        ResponseEnvelope::Error(ErrorEnvelope {
            error: err.to_string(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseEnvelope::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ResponseEnvelope::Error(e) => Some(&e.error),
            ResponseEnvelope::Success(_) => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ResponseEnvelope::Error(e) => serde_json::json!({ "error": e.error }),
            ResponseEnvelope::Success(map) => Value::Object(map),
        }
    }

    pub fn to_text(&self) -> String {
        // Map / String 序列化不会失败
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"Failed to process request"}"#.to_string())
    }
}

/// 请求格式说明（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
pub(crate) struct RequestFormat {
    /// Action name, e.g. loadSave or getPokemon
    pub action: String,
    /// Session identifier returned by loadSave; required by most actions
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    /// Action-specific parameters, given as top-level sibling keys
    #[serde(flatten)]
    pub arguments: std::collections::BTreeMap<String, Value>,
}
