//! HTML 协议文档
//!
//! 只读 Schema 投影的输出：按分类分组，列出每个 Action 的名称、是否需要会话、说明、参数，
//! 并按类型生成一条示例请求。Schema 缺少 `components.messages` 时输出错误页。

use std::fmt::Write as _;

use serde_json::Value;

use crate::schema::SYSTEM_TAG;

struct ActionDoc<'a> {
    name: &'a str,
    description: &'a str,
    requires_session: bool,
    params: Vec<ParamDoc<'a>>,
    response: Vec<(&'a str, &'a str, &'a str)>,
}

struct ParamDoc<'a> {
    name: &'a str,
    ty: &'a str,
    description: &'a str,
    required: bool,
}

/// 渲染完整 HTML 页面
pub fn render(schema: &Value) -> String {
    let Some(messages) = schema
        .get("components")
        .and_then(|c| c.get("messages"))
        .and_then(Value::as_object)
    else {
        return error_page("No messages found in schema");
    };

    let mut groups: Vec<(&str, Vec<ActionDoc>)> = Vec::new();
    for (name, message) in messages {
        let category = message
            .pointer("/tags/0/name")
            .and_then(Value::as_str)
            .unwrap_or("general");
        if category == SYSTEM_TAG {
            continue;
        }
        let Some(doc) = action_doc(name, message) else {
            continue;
        };
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, docs)) => docs.push(doc),
            None => groups.push((category, vec![doc])),
        }
    }
    groups.sort_by(|a, b| a.0.cmp(b.0));
    for (_, docs) in &mut groups {
        docs.sort_by(|a, b| a.name.cmp(b.name));
    }

    let title = schema.pointer("/info/title").and_then(Value::as_str).unwrap_or("WebSocket API");
    let subtitle = schema.pointer("/info/description").and_then(Value::as_str).unwrap_or("");
    let version = schema.pointer("/info/version").and_then(Value::as_str).unwrap_or("");

    let mut html = String::with_capacity(64 * 1024);
    let _ = write!(html, "{}", head(title));
    let _ = write!(
        html,
        r#"
    <div class="container">
        <h1>{title} Documentation</h1>
        <p class="subtitle">{subtitle} <span class="version">v{version}</span></p>

        <div class="intro">
            <h3>Getting Started</h3>
            <p>Connect to the WebSocket server and send JSON messages with an <code>action</code> field:</p>
            <ul>
                <li><strong>Load a save file:</strong> Send <code>{{"action": "loadSave", "data": "..."}}</code></li>
                <li><strong>Use the returned sessionId:</strong> Include it in subsequent requests</li>
                <li><strong>Example:</strong> <code>{{"action": "getPokemon", "sessionId": "your-session-id", "box": 0, "slot": 0}}</code></li>
            </ul>
            <p><strong>API Schema:</strong> Send an OPTIONS request to <code>/</code> for the complete AsyncAPI 2.6.0 schema</p>
        </div>
"#,
        title = escape(title),
        subtitle = escape(subtitle),
        version = escape(version),
    );

    for (category, docs) in &groups {
        let _ = write!(html, "\n        <h2>{}</h2>\n", escape(&capitalize(category)));
        for doc in docs {
            write_action(&mut html, doc);
        }
    }

    html.push_str("\n    </div>\n</body>\n</html>\n");
    html
}

/// 示例值表
pub fn example_value(ty: &str) -> &'static str {
    match ty {
        "string" => "\"example\"",
        "integer" | "number" => "0",
        "boolean" => "true",
        "object" => "{}",
        "array" => "[]",
        _ => "null",
    }
}

/// 生成示例请求；需要会话时 sessionId 紧跟 action
fn example_request(doc: &ActionDoc) -> String {
    let mut lines = vec![format!("  \"action\": \"{}\"", doc.name)];
    if doc.requires_session {
        lines.push("  \"sessionId\": \"your-session-id\"".to_string());
    }
    for param in &doc.params {
        lines.push(format!("  \"{}\": {}", param.name, example_value(param.ty)));
    }
    format!("{{\n{}\n}}", lines.join(",\n"))
}

fn action_doc<'a>(name: &'a str, message: &'a Value) -> Option<ActionDoc<'a>> {
    let payload = message.get("payload")?;
    let properties = payload.get("properties").and_then(Value::as_object)?;
    let required: Vec<&str> = payload
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let params: Vec<ParamDoc> = properties
        .iter()
        .filter(|(key, _)| key.as_str() != "action" && key.as_str() != "sessionId")
        .map(|(key, prop)| ParamDoc {
            name: key,
            ty: prop.get("type").and_then(Value::as_str).unwrap_or("any"),
            description: prop.get("description").and_then(Value::as_str).unwrap_or(""),
            required: required.contains(&key.as_str()),
        })
        .collect();

    let response: Vec<(&str, &str, &str)> = message
        .pointer("/x-response/properties")
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(key, field)| {
                    (
                        key.as_str(),
                        field.get("type").and_then(Value::as_str).unwrap_or("any"),
                        field.get("description").and_then(Value::as_str).unwrap_or(""),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    Some(ActionDoc {
        name,
        description: message.get("summary").and_then(Value::as_str).unwrap_or(""),
        requires_session: required.contains(&"sessionId"),
        params,
        response,
    })
}

fn write_action(html: &mut String, doc: &ActionDoc) {
    let badge = if doc.requires_session {
        r#"<span class="session-badge">Requires sessionId</span>"#
    } else {
        ""
    };
    let _ = write!(
        html,
        r#"
        <div class="action" id="{name}">
            <div class="action-name">{name}{badge}</div>
            <div class="action-desc">{desc}</div>"#,
        name = escape(doc.name),
        desc = escape(doc.description),
    );

    if !doc.params.is_empty() {
        html.push_str(
            r#"
            <div class="params">
                <div class="params-title">Parameters:</div>"#,
        );
        for param in &doc.params {
            let required = if param.required {
                r#"<span class="param-required">(required)</span>"#
            } else {
                ""
            };
            let _ = write!(
                html,
                r#"
                <div class="param">
                    <span class="param-name">{}</span>
                    <span class="param-type">{}</span>{}"#,
                escape(param.name),
                escape(param.ty),
                required,
            );
            if !param.description.is_empty() {
                let _ = write!(html, r#"<div class="param-desc">{}</div>"#, escape(param.description));
            }
            html.push_str("\n                </div>");
        }
        html.push_str("\n            </div>");
    }

    if !doc.response.is_empty() {
        html.push_str(
            r#"
            <div class="params">
                <div class="params-title">Response:</div>"#,
        );
        for (name, ty, description) in &doc.response {
            let _ = write!(
                html,
                r#"
                <div class="param">
                    <span class="param-name">{}</span>
                    <span class="param-type">{}</span><div class="param-desc">{}</div>
                </div>"#,
                escape(name),
                escape(ty),
                escape(description),
            );
        }
        html.push_str("\n            </div>");
    }

    let _ = write!(
        html,
        r#"
            <div class="example">
                <div class="example-title">Request Example:</div>
                <pre><code>{}</code></pre>
            </div>
        </div>"#,
        escape(&example_request(doc)),
    );
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn error_page(error: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body><h1>Error generating documentation</h1><p>{}</p></body></html>",
        escape(error)
    )
}

fn head(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} Documentation</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; background: #f5f5f5; padding: 20px; }}
        .container {{ max-width: 1200px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}
        h1 {{ color: #2c3e50; margin-bottom: 10px; border-bottom: 3px solid #3498db; padding-bottom: 10px; }}
        h2 {{ color: #2980b9; margin-top: 40px; margin-bottom: 20px; padding-bottom: 10px; border-bottom: 2px solid #ecf0f1; }}
        .subtitle {{ color: #7f8c8d; margin-bottom: 30px; }}
        .version {{ font-size: 0.85em; color: #95a5a6; }}
        .intro {{ background: #e8f4f8; padding: 20px; border-radius: 4px; margin-bottom: 30px; border-left: 4px solid #3498db; }}
        .intro ul {{ margin-left: 20px; margin-top: 10px; }}
        .action {{ background: #f8f9fa; border-left: 4px solid #3498db; padding: 20px; margin-bottom: 20px; border-radius: 4px; }}
        .action-name {{ font-size: 1.3em; font-weight: bold; color: #2c3e50; margin-bottom: 8px; font-family: 'Courier New', monospace; }}
        .action-desc {{ color: #555; margin-bottom: 15px; }}
        .session-badge {{ display: inline-block; background: #e74c3c; color: white; padding: 2px 8px; border-radius: 3px; font-size: 0.8em; margin-left: 10px; }}
        .params {{ margin-top: 15px; }}
        .params-title {{ font-weight: bold; color: #2c3e50; margin-bottom: 10px; }}
        .param {{ background: white; padding: 10px; margin-bottom: 8px; border-radius: 4px; border: 1px solid #e0e0e0; }}
        .param-name {{ font-family: 'Courier New', monospace; color: #8e44ad; font-weight: bold; }}
        .param-type {{ color: #16a085; font-style: italic; margin-left: 8px; }}
        .param-required {{ color: #e74c3c; font-size: 0.85em; margin-left: 8px; }}
        .param-desc {{ color: #666; margin-top: 4px; font-size: 0.95em; }}
        .example {{ background: #2c3e50; color: #ecf0f1; padding: 15px; border-radius: 4px; margin-top: 15px; overflow-x: auto; }}
        .example-title {{ color: #3498db; font-weight: bold; margin-bottom: 8px; }}
        pre {{ margin: 0; }}
        code {{ font-family: 'Courier New', monospace; }}
    </style>
</head>
<body>"#,
        escape(title)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiSection;
    use crate::registry::ActionRegistry;
    use serde_json::json;

    fn builtin_html() -> String {
        let registry = ActionRegistry::builtin().unwrap();
        render(&crate::schema::project(&registry, &ApiSection::default()))
    }

    #[test]
    fn test_example_value_table() {
        assert_eq!(example_value("string"), "\"example\"");
        assert_eq!(example_value("integer"), "0");
        assert_eq!(example_value("number"), "0");
        assert_eq!(example_value("boolean"), "true");
        assert_eq!(example_value("object"), "{}");
        assert_eq!(example_value("array"), "[]");
        assert_eq!(example_value("binary"), "null");
    }

    #[test]
    fn test_session_example_puts_session_id_first() {
        let schema = json!({
            "components": { "messages": {
                "getPokemon": {
                    "summary": "Get one",
                    "tags": [{ "name": "pokemon" }],
                    "payload": {
                        "required": ["action", "box", "slot", "sessionId"],
                        "properties": {
                            "action": { "type": "string", "const": "getPokemon" },
                            "box": { "type": "integer" },
                            "slot": { "type": "integer" },
                            "sessionId": { "type": "string" }
                        }
                    }
                }
            }}
        });
        let doc = action_doc("getPokemon", &schema["components"]["messages"]["getPokemon"]).unwrap();
        assert!(doc.requires_session);
        assert_eq!(doc.params.len(), 2);
        assert_eq!(
            example_request(&doc),
            "{\n  \"action\": \"getPokemon\",\n  \"sessionId\": \"your-session-id\",\n  \"box\": 0,\n  \"slot\": 0\n}"
        );
    }

    #[test]
    fn test_groups_and_badges() {
        let html = builtin_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h2>Save</h2>"));
        assert!(html.contains("<h2>Knowledge</h2>"));
        assert!(html.find("<h2>Knowledge</h2>") < html.find("<h2>Save</h2>"));
        // 系统消息不出现在文档中
        assert!(!html.contains("errorResponse"));

        assert!(html.contains(r#"<div class="action-name">getPokemon<span class="session-badge">Requires sessionId</span></div>"#));
        assert!(html.contains(r#"<div class="action-name">listSessions</div>"#));
        assert!(html.contains(r#"<div class="action-name">getSpeciesName</div>"#));
    }

    #[test]
    fn test_categories_sorted_by_key() {
        let html = builtin_html();
        let headings: Vec<&str> = html
            .match_indices("<h2>")
            .filter_map(|(at, _)| html[at + 4..].split_once("</h2>").map(|(heading, _)| heading))
            .collect();
        assert_eq!(headings.len(), 10);

        let mut sorted = headings.clone();
        sorted.sort_by_key(|heading| heading.to_lowercase());
        assert_eq!(headings, sorted);
        assert_eq!(headings.first(), Some(&"Communication"));
        assert_eq!(headings.last(), Some(&"World"));
    }

    #[test]
    fn test_missing_messages_renders_error_page() {
        let html = render(&json!({ "info": { "title": "x" } }));
        assert!(html.contains("Error generating documentation"));
        assert!(html.contains("No messages found in schema"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
