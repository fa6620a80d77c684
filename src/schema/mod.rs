//! 协议 Schema 投影（AsyncAPI 2.6.0）
//!
//! 纯函数：同一份声明表 + [api] 配置总是产生相同输出（serde_json 开启 preserve_order，
//! 声明表已按 (category, name) 排序）。请求 / 错误信封的 JSON Schema 由 schemars 生成。

use std::sync::OnceLock;

use regex::Regex;
use schemars::schema_for;
use serde_json::{json, Map, Value};

use crate::config::ApiSection;
use crate::gateway::{ErrorEnvelope, RequestFormat};
use crate::registry::{ActionDescriptor, ActionRegistry, ParamSpec};

pub const ASYNCAPI_VERSION: &str = "2.6.0";
pub const SUCCESS_MESSAGE: &str = "successResponse";
pub const ERROR_MESSAGE: &str = "errorResponse";
/// 系统消息的 tag，文档投影据此跳过
pub const SYSTEM_TAG: &str = "system";

/// 由声明表生成完整协议描述
pub fn project(registry: &ActionRegistry, api: &ApiSection) -> Value {
    let mut messages = Map::new();
    let mut publish = Vec::with_capacity(registry.len());

    for descriptor in registry.descriptors() {
        messages.insert(descriptor.name.to_string(), message(descriptor));
        publish.push(message_ref(descriptor.name));
    }
    messages.insert(ERROR_MESSAGE.to_string(), error_message());
    messages.insert(SUCCESS_MESSAGE.to_string(), success_message());

    json!({
        "asyncapi": ASYNCAPI_VERSION,
        "info": {
            "title": api.title,
            "version": api.version,
            "description": api.description,
        },
        "servers": {
            "production": {
                "url": api.public_url,
                "protocol": "ws",
                "description": "WebSocket endpoint",
            }
        },
        "channels": {
            "/": {
                "subscribe": {
                    "description": "Receive responses from the server",
                    "message": { "oneOf": [message_ref(SUCCESS_MESSAGE), message_ref(ERROR_MESSAGE)] },
                },
                "publish": {
                    "description": "Send action requests to the server",
                    "message": { "oneOf": publish },
                },
            }
        },
        "components": {
            "messages": messages,
            "schemas": {
                "RequestEnvelope": serde_json::to_value(schema_for!(RequestFormat)).unwrap_or(Value::Null),
                "ErrorEnvelope": serde_json::to_value(schema_for!(ErrorEnvelope)).unwrap_or(Value::Null),
            },
        },
    })
}

/// 缩进输出
pub fn to_pretty(schema: &Value) -> String {
    serde_json::to_string_pretty(schema).unwrap_or_else(|_| String::new())
}

/// `getPokemon` → `Get Pokemon`
pub fn humanize(name: &str) -> String {
    static CAMEL_RE: OnceLock<Regex> = OnceLock::new();
    let re = CAMEL_RE.get_or_init(|| Regex::new(r"([a-z])([A-Z])").unwrap());
    let spaced = re.replace_all(name, "$1 $2");

    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn message_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/messages/{}", name) })
}

fn message(descriptor: &ActionDescriptor) -> Value {
    let mut properties = Map::new();
    properties.insert(
        "action".to_string(),
        json!({ "type": "string", "const": descriptor.name }),
    );
    let mut required = vec![Value::from("action")];

    for spec in &descriptor.params {
        properties.insert(spec.name.to_string(), parameter(spec));
        if spec.required {
            required.push(Value::from(spec.name));
        }
    }

    if descriptor.requires_session {
        properties.insert(
            "sessionId".to_string(),
            json!({
                "type": "string",
                "description": "Session identifier from loadSave",
                "required": true,
            }),
        );
        required.push(Value::from("sessionId"));
    }

    json!({
        "name": descriptor.name,
        "title": humanize(descriptor.name),
        "summary": descriptor.description,
        "tags": [{ "name": descriptor.category.tag() }],
        "payload": {
            "type": "object",
            "required": required,
            "properties": properties,
        },
        "x-response": response(descriptor),
    })
}

fn parameter(spec: &ParamSpec) -> Value {
    let mut property = Map::new();
    property.insert("type".to_string(), Value::from(spec.ty.as_str()));
    property.insert("required".to_string(), Value::from(spec.required));
    if let Some(description) = spec.description {
        property.insert("description".to_string(), Value::from(description));
    }
    if let Some(default) = &spec.default {
        property.insert("default".to_string(), default.clone());
    }
    if let Some(format) = spec.format {
        property.insert("format".to_string(), Value::from(format));
    }
    Value::Object(property)
}

fn response(descriptor: &ActionDescriptor) -> Value {
    if descriptor.response.is_empty() {
        return json!({ "type": "object", "description": "Response varies by action" });
    }
    let fields: Map<String, Value> = descriptor
        .response
        .iter()
        .map(|field| {
            (
                field.name.to_string(),
                json!({ "type": field.ty.as_str(), "description": field.description }),
            )
        })
        .collect();
    json!({ "type": "object", "properties": fields })
}

fn error_message() -> Value {
    json!({
        "name": ERROR_MESSAGE,
        "title": "Error Response",
        "summary": "Error message returned when an action fails",
        "tags": [{ "name": SYSTEM_TAG }],
        "payload": {
            "type": "object",
            "required": ["error"],
            "properties": {
                "error": {
                    "type": "string",
                    "description": "Error message describing what went wrong",
                }
            },
        },
    })
}

fn success_message() -> Value {
    json!({
        "name": SUCCESS_MESSAGE,
        "title": "Success Response",
        "summary": "Successful response from an action",
        "tags": [{ "name": SYSTEM_TAG }],
        "payload": {
            "type": "object",
            "description": "Response varies by action",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> (ActionRegistry, Value) {
        let registry = ActionRegistry::builtin().unwrap();
        let schema = project(&registry, &ApiSection::default());
        (registry, schema)
    }

    fn required(message: &Value) -> Vec<&str> {
        message["payload"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_message_key_matches_action_name() {
        let (registry, schema) = builtin();
        let messages = schema["components"]["messages"].as_object().unwrap();
        // 每个 Action 一条，外加两条系统消息
        assert_eq!(messages.len(), registry.len() + 2);

        for descriptor in registry.descriptors() {
            let message = &messages[descriptor.name];
            assert_eq!(message["name"], descriptor.name);
            assert_eq!(message["payload"]["properties"]["action"]["const"], descriptor.name);
        }
    }

    #[test]
    fn test_session_id_required_iff_declared() {
        let (registry, schema) = builtin();
        for descriptor in registry.descriptors() {
            let message = &schema["components"]["messages"][descriptor.name];
            let needs = required(message).contains(&"sessionId");
            assert_eq!(needs, descriptor.requires_session, "{}", descriptor.name);
            assert_eq!(
                message["payload"]["properties"].get("sessionId").is_some(),
                descriptor.requires_session
            );
        }

        let messages = &schema["components"]["messages"];
        assert!(!required(&messages["listSessions"]).contains(&"sessionId"));
        assert!(!required(&messages["getSpeciesName"]).contains(&"sessionId"));
        assert!(required(&messages["unloadSession"]).contains(&"sessionId"));
    }

    #[test]
    fn test_parameter_metadata() {
        let (_, schema) = builtin();
        let load = &schema["components"]["messages"]["loadSave"];
        assert_eq!(required(load), vec!["action", "data"]);
        assert_eq!(load["payload"]["properties"]["data"]["format"], "base64");
        assert_eq!(load["title"], "Load Save");
        assert_eq!(load["tags"][0]["name"], "save");

        let add = &schema["components"]["messages"]["addItemToPouch"]["payload"];
        assert_eq!(add["properties"]["count"]["default"], 1);
        assert_eq!(add["properties"]["count"]["required"], false);
    }

    #[test]
    fn test_channels_and_system_messages() {
        let (registry, schema) = builtin();
        let channel = &schema["channels"]["/"];
        assert_eq!(
            channel["publish"]["message"]["oneOf"].as_array().unwrap().len(),
            registry.len()
        );
        assert_eq!(
            channel["subscribe"]["message"]["oneOf"][1]["$ref"],
            "#/components/messages/errorResponse"
        );

        let error = &schema["components"]["messages"]["errorResponse"];
        assert_eq!(required(error), vec!["error"]);
        assert_eq!(schema["servers"]["production"]["url"], "ws://localhost:3030");
        assert!(schema["components"]["schemas"]["ErrorEnvelope"].is_object());
    }

    #[test]
    fn test_output_is_deterministic() {
        let (registry, first) = builtin();
        let second = project(&registry, &ApiSection::default());
        assert_eq!(to_pretty(&first), to_pretty(&second));

        let rebuilt = project(&ActionRegistry::builtin().unwrap(), &ApiSection::default());
        assert_eq!(to_pretty(&first), to_pretty(&rebuilt));
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("getPokemon"), "Get Pokemon");
        assert_eq!(humanize("setPokedexCaught"), "Set Pokedex Caught");
        assert_eq!(humanize("getHallOfFame"), "Get Hall Of Fame");
        assert_eq!(humanize(""), "");
    }
}
