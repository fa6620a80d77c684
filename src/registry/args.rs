//! 参数提取与类型转换
//!
//! 请求中的参数与 `action` / `sessionId` 平级。分发器按声明逐个提取：
//! 缺省（或 null）时取默认值，必填缺失报错，其余按声明类型转换。
//! handler 只从 `Arguments` 读取已经校验过的值。

use serde_json::{Map, Number, Value};

use super::{ParamSpec, ParamType};
use crate::core::error::RpcError;

/// 已转换的参数集
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    /// 按声明从原始请求字段中提取参数；未声明的字段忽略
    pub fn coerce(specs: &[ParamSpec], raw: &Map<String, Value>) -> Result<Self, RpcError> {
        let mut values = Map::new();
        for spec in specs {
            let provided = raw.get(spec.name).filter(|v| !v.is_null());
            let value = match (provided, &spec.default) {
                (Some(value), _) => coerce_value(spec, value)?,
                (None, Some(default)) => default.clone(),
                (None, None) if spec.required => {
                    return Err(RpcError::MissingParameter(spec.name.to_string()))
                }
                (None, None) => continue,
            };
            values.insert(spec.name.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn int(&self, name: &str) -> Result<i64, RpcError> {
        self.opt_int(name)
            .ok_or_else(|| RpcError::MissingParameter(name.to_string()))
    }

    pub fn opt_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn bool(&self, name: &str) -> Result<bool, RpcError> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| RpcError::MissingParameter(name.to_string()))
    }

    pub fn str(&self, name: &str) -> Result<&str, RpcError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::MissingParameter(name.to_string()))
    }

    pub fn object(&self, name: &str) -> Result<&Map<String, Value>, RpcError> {
        self.get(name)
            .and_then(Value::as_object)
            .ok_or_else(|| RpcError::MissingParameter(name.to_string()))
    }
}

fn coerce_value(spec: &ParamSpec, value: &Value) -> Result<Value, RpcError> {
    let coerced = match spec.ty {
        ParamType::Integer => to_integer(value).map(Value::from),
        ParamType::Number => to_number(value).map(Value::Number),
        ParamType::Boolean => to_boolean(value).map(Value::Bool),
        ParamType::String => to_text(value).map(Value::String),
        ParamType::Object => value.is_object().then(|| value.clone()),
        ParamType::Array => value.is_array().then(|| value.clone()),
    };
    coerced.ok_or_else(|| RpcError::invalid(spec.name, expected(spec.ty)))
}

fn expected(ty: ParamType) -> &'static str {
    match ty {
        ParamType::String => "a string",
        ParamType::Integer => "an integer",
        ParamType::Number => "a number",
        ParamType::Boolean => "a boolean",
        ParamType::Object => "an object",
        ParamType::Array => "an array",
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(Number::from_f64),
        _ => None,
    }
}

fn to_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn specs() -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("itemId", ParamType::Integer),
            ParamSpec::optional("count", ParamType::Integer).with_default(1),
            ParamSpec::optional("pouchIndex", ParamType::Integer),
        ]
    }

    #[test]
    fn test_defaults_and_optional() {
        let args = Arguments::coerce(&specs(), &raw(json!({ "itemId": 4 }))).unwrap();
        assert_eq!(args.int("itemId").unwrap(), 4);
        assert_eq!(args.int("count").unwrap(), 1);
        assert_eq!(args.opt_int("pouchIndex"), None);
    }

    #[test]
    fn test_missing_required() {
        let err = Arguments::coerce(&specs(), &raw(json!({ "count": 2 }))).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter 'itemId'");

        // null 视同缺省
        let err = Arguments::coerce(&specs(), &raw(json!({ "itemId": null }))).unwrap_err();
        assert_eq!(err, RpcError::MissingParameter("itemId".into()));
    }

    #[test]
    fn test_integer_coercion() {
        let args = Arguments::coerce(&specs(), &raw(json!({ "itemId": "17", "count": 3.0 }))).unwrap();
        assert_eq!(args.int("itemId").unwrap(), 17);
        assert_eq!(args.int("count").unwrap(), 3);

        let err = Arguments::coerce(&specs(), &raw(json!({ "itemId": 1.5 }))).unwrap_err();
        assert_eq!(err.to_string(), "Parameter 'itemId' must be an integer");

        let err = Arguments::coerce(&specs(), &raw(json!({ "itemId": "abc" }))).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_boolean_and_string_coercion() {
        let specs = vec![
            ParamSpec::optional("value", ParamType::Boolean).with_default(true),
            ParamSpec::required("rivalName", ParamType::String),
            ParamSpec::optional("trainer", ParamType::Object),
        ];

        let args = Arguments::coerce(&specs, &raw(json!({ "value": "false", "rivalName": 42 }))).unwrap();
        assert!(!args.bool("value").unwrap());
        assert_eq!(args.str("rivalName").unwrap(), "42");

        let args = Arguments::coerce(&specs, &raw(json!({ "value": 1, "rivalName": "GARY" }))).unwrap();
        assert!(args.bool("value").unwrap());

        let err = Arguments::coerce(&specs, &raw(json!({ "rivalName": "x", "trainer": [1] }))).unwrap_err();
        assert_eq!(err.to_string(), "Parameter 'trainer' must be an object");
    }

    #[test]
    fn test_undeclared_fields_ignored() {
        let args = Arguments::coerce(&specs(), &raw(json!({ "itemId": 1, "extra": "x" }))).unwrap();
        assert!(args.get("extra").is_none());
    }
}
