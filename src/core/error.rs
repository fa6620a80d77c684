//! 错误类型
//!
//! - `RpcError`：单次请求内的协议 / 校验 / 领域错误，`Display` 即为响应中的 `error` 文本
//! - `RegistryError`：启动阶段 Action 声明表的致命错误（重名、元数据非法）

use thiserror::Error;

use crate::engine::DomainError;

/// 单次请求处理中可能出现的错误；最终都会被包装为 `{"error": "..."}` 响应
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    /// 请求无法解析为 JSON 对象
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unknown action")]
    UnknownAction,

    #[error("sessionId is required for this action")]
    SessionRequired,

    #[error("Session ID '{0}' not found")]
    SessionNotFound(String),

    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("Parameter '{name}' must be {expected}")]
    InvalidParameter { name: String, expected: &'static str },

    /// 索引或数值越界，消息由调用方给出（如 "Invalid box index. Must be between 0 and 31"）
    #[error("{0}")]
    OutOfRange(String),

    /// 参数值不合法（空数据、base64 解码失败、槽位为空等），消息由调用方给出
    #[error("{0}")]
    InvalidValue(String),

    /// 文档引擎抛出的领域错误
    #[error("{0}")]
    Domain(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// 内部故障（handler panic 等），细节仅写日志，不暴露给客户端
    #[error("Failed to process request")]
    Internal(String),
}

impl RpcError {
    pub fn invalid(name: &str, expected: &'static str) -> Self {
        RpcError::InvalidParameter {
            name: name.to_string(),
            expected,
        }
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        RpcError::OutOfRange(message.into())
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        RpcError::InvalidValue(message.into())
    }

    /// 错误类别，用于审计日志
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::MalformedRequest(_)
            | RpcError::UnknownAction
            | RpcError::SessionRequired
            | RpcError::SessionNotFound(_) => "protocol",
            RpcError::MissingParameter(_)
            | RpcError::InvalidParameter { .. }
            | RpcError::OutOfRange(_)
            | RpcError::InvalidValue(_) => "validation",
            RpcError::Domain(_) => "domain",
            RpcError::Timeout(_) => "timeout",
            RpcError::Internal(_) => "internal",
        }
    }
}

impl From<DomainError> for RpcError {
    fn from(err: DomainError) -> Self {
        RpcError::Domain(err.to_string())
    }
}

/// Action 声明表构建失败（启动即终止，不拖到请求时）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate action name: {0}")]
    DuplicateAction(String),

    #[error("Action name must not be empty")]
    EmptyActionName,

    #[error("Action '{action}' declares parameter '{param}' twice")]
    DuplicateParameter { action: String, param: String },

    #[error("Action '{action}' uses reserved parameter name '{param}'")]
    ReservedParameter { action: String, param: String },

    #[error("Action '{action}' parameter '{param}' has a default that does not match its type")]
    InvalidDefault { action: String, param: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Capability;

    #[test]
    fn test_wire_messages() {
        assert_eq!(RpcError::UnknownAction.to_string(), "Unknown action");
        assert_eq!(
            RpcError::SessionRequired.to_string(),
            "sessionId is required for this action"
        );
        assert_eq!(
            RpcError::SessionNotFound("bogus".into()).to_string(),
            "Session ID 'bogus' not found"
        );
        assert_eq!(
            RpcError::invalid("box", "an integer").to_string(),
            "Parameter 'box' must be an integer"
        );
        assert_eq!(
            RpcError::Internal("panic".into()).to_string(),
            "Failed to process request"
        );
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: RpcError = DomainError::Unsupported(Capability::Coins).into();
        assert_eq!(err.kind(), "domain");
        assert_eq!(err.to_string(), "Coins not supported for this save file");
    }
}
