//! Action 声明表
//!
//! 每个 Action 只声明一次（`ActionDescriptor` + handler），同一份声明同时驱动
//! 运行时分发（gateway::dispatcher）、协议 Schema（schema）与 HTML 文档（docs）。
//! 声明表在启动时构建并校验，之后只读。

pub mod args;
pub mod catalog;

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::core::error::{RegistryError, RpcError};
use crate::engine::{Document, DocumentEngine, GameData};

pub use args::Arguments;

/// Action 分类（仅用于文档分组与 Schema tag），顺序即文档中的分组顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionCategory {
    Save,
    Pokemon,
    Storage,
    Items,
    Pokedex,
    Trainer,
    Progress,
    Communication,
    World,
    Knowledge,
}

impl ActionCategory {
    pub fn tag(&self) -> &'static str {
        match self {
            ActionCategory::Save => "save",
            ActionCategory::Pokemon => "pokemon",
            ActionCategory::Storage => "storage",
            ActionCategory::Items => "items",
            ActionCategory::Pokedex => "pokedex",
            ActionCategory::Trainer => "trainer",
            ActionCategory::Progress => "progress",
            ActionCategory::Communication => "communication",
            ActionCategory::World => "world",
            ActionCategory::Knowledge => "knowledge",
        }
    }
}

/// 参数类型，对应 JSON Schema 的 type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }

    /// 声明的默认值是否与类型一致
    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

/// 单个参数声明
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    /// 格式提示（如 "base64"）
    pub format: Option<&'static str>,
    pub description: Option<&'static str>,
}

impl ParamSpec {
    pub fn required(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
            format: None,
            description: None,
        }
    }

    pub fn optional(name: &'static str, ty: ParamType) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty)
        }
    }

    /// 带默认值的参数一律视为可选
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn with_format(mut self, format: &'static str) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// 响应字段说明（只用于文档，运行时不校验）
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseField {
    pub name: &'static str,
    pub ty: ParamType,
    pub description: &'static str,
}

/// Action 元数据
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    pub name: &'static str,
    pub category: ActionCategory,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub requires_session: bool,
    pub response: Vec<ResponseField>,
}

impl ActionDescriptor {
    pub fn new(name: &'static str, category: ActionCategory, description: &'static str) -> Self {
        Self {
            name,
            category,
            description,
            params: Vec::new(),
            requires_session: true,
            response: Vec::new(),
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn returns(mut self, name: &'static str, ty: ParamType, description: &'static str) -> Self {
        self.response.push(ResponseField {
            name,
            ty,
            description,
        });
        self
    }

    /// 作用于会话文档
    pub fn document(self, handler: DocumentHandler) -> ActionEntry {
        ActionEntry {
            descriptor: Self {
                requires_session: true,
                ..self
            },
            handler: HandlerKind::Document(handler),
        }
    }

    /// 只查询静态游戏数据，不需要会话
    pub fn knowledge(self, handler: KnowledgeHandler) -> ActionEntry {
        ActionEntry {
            descriptor: Self {
                requires_session: false,
                ..self
            },
            handler: HandlerKind::Knowledge(handler),
        }
    }

    /// 创建会话（loadSave）
    pub fn creates_session(self, handler: CreateHandler) -> ActionEntry {
        ActionEntry {
            descriptor: Self {
                requires_session: false,
                ..self
            },
            handler: HandlerKind::CreateSession(handler),
        }
    }

    /// 枚举会话（listSessions）
    pub fn lists_sessions(self) -> ActionEntry {
        ActionEntry {
            descriptor: Self {
                requires_session: false,
                ..self
            },
            handler: HandlerKind::ListSessions,
        }
    }

    /// 销毁会话（unloadSession）
    pub fn destroys_session(self) -> ActionEntry {
        ActionEntry {
            descriptor: Self {
                requires_session: true,
                ..self
            },
            handler: HandlerKind::DestroySession,
        }
    }
}

pub type DocumentHandler = fn(&mut dyn Document, &Arguments) -> Result<Value, RpcError>;
pub type KnowledgeHandler = fn(&dyn GameData, &Arguments) -> Result<Value, RpcError>;
pub type CreateHandler =
    fn(&dyn DocumentEngine, &Arguments) -> Result<(Box<dyn Document>, Value), RpcError>;

/// handler 形态；会话成员变化只能经由 CreateSession / DestroySession
#[derive(Clone, Copy)]
pub enum HandlerKind {
    Document(DocumentHandler),
    Knowledge(KnowledgeHandler),
    CreateSession(CreateHandler),
    ListSessions,
    DestroySession,
}

impl std::fmt::Debug for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            HandlerKind::Document(_) => "Document",
            HandlerKind::Knowledge(_) => "Knowledge",
            HandlerKind::CreateSession(_) => "CreateSession",
            HandlerKind::ListSessions => "ListSessions",
            HandlerKind::DestroySession => "DestroySession",
        };
        f.write_str(kind)
    }
}

/// 声明 + handler
#[derive(Debug, Clone)]
pub struct ActionEntry {
    pub descriptor: ActionDescriptor,
    pub handler: HandlerKind,
}

const RESERVED_PARAMS: [&str; 2] = ["action", "sessionId"];

/// 只读声明表：按名 O(1) 查找，按 (category, name) 有序枚举
#[derive(Debug)]
pub struct ActionRegistry {
    entries: Vec<ActionEntry>,
    index: HashMap<&'static str, usize>,
}

impl ActionRegistry {
    /// 内置全部 Action
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_entries(catalog::entries())
    }

    pub fn from_entries(mut entries: Vec<ActionEntry>) -> Result<Self, RegistryError> {
        for entry in &entries {
            validate(&entry.descriptor)?;
        }

        entries.sort_by(|a, b| {
            (a.descriptor.category, a.descriptor.name).cmp(&(b.descriptor.category, b.descriptor.name))
        });

        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let name = entry.descriptor.name;
            if index.insert(name, position).is_some() {
                return Err(RegistryError::DuplicateAction(name.to_string()));
            }
        }

        Ok(Self { entries, index })
    }

    pub fn get(&self, name: &str) -> Option<&ActionEntry> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    /// 按 (category, name) 排序
    pub fn descriptors(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors().map(|d| d.name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate(descriptor: &ActionDescriptor) -> Result<(), RegistryError> {
    let action = descriptor.name;
    if action.trim().is_empty() {
        return Err(RegistryError::EmptyActionName);
    }

    let mut seen = HashSet::new();
    for spec in &descriptor.params {
        let (action, param) = (action.to_string(), spec.name.to_string());
        if RESERVED_PARAMS.contains(&spec.name) {
            return Err(RegistryError::ReservedParameter { action, param });
        }
        if !seen.insert(spec.name) {
            return Err(RegistryError::DuplicateParameter { action, param });
        }
        if let Some(default) = &spec.default {
            if !spec.ty.accepts(default) {
                return Err(RegistryError::InvalidDefault { action, param });
            }
        }
    }
    Ok(())
}
