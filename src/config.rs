//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SAVEHUB__*` 覆盖（双下划线表示嵌套，如 `SAVEHUB__SERVER__BIND_ADDR=0.0.0.0:3030`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub api: ApiSection,
}

/// [server] 段：监听地址、帧大小、心跳与请求超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: String,
    /// 出站消息分片大小（字节）
    pub max_frame_bytes: usize,
    /// 入站消息重组上限（字节）
    pub max_message_bytes: usize,
    /// 空闲连接 ping 间隔（秒），0 关闭
    pub keepalive_secs: u64,
    /// 单次请求超时（秒），0 关闭
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3030".to_string(),
            max_frame_bytes: 1024 * 1024,
            max_message_bytes: 64 * 1024 * 1024,
            keepalive_secs: 120,
            request_timeout_secs: 0,
        }
    }
}

/// [api] 段：协议描述文档的 info / servers 字段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub title: String,
    pub description: String,
    pub version: String,
    /// 对外公布的 WebSocket 地址
    pub public_url: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            title: "SaveHub WebSocket API".to_string(),
            description: "WebSocket API for reading and manipulating Pokemon save files".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            public_url: "ws://localhost:3030".to_string(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 SAVEHUB__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SAVEHUB__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SAVEHUB")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:3030");
        assert_eq!(config.server.max_frame_bytes, 1_048_576);
        assert_eq!(config.server.keepalive_secs, 120);
        assert_eq!(config.server.request_timeout_secs, 0);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nbind_addr = \"0.0.0.0:9000\"\nrequest_timeout_secs = 5\n[api]\ntitle = \"Test API\"").unwrap();

        let config = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.server.request_timeout_secs, 5);
        // 未出现的键保持默认
        assert_eq!(config.server.max_frame_bytes, 1_048_576);
        assert_eq!(config.api.title, "Test API");
        assert_eq!(config.api.public_url, "ws://localhost:3030");
    }
}
