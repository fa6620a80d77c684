//! 文档引擎（外部协作者）接口
//!
//! 网关本身不解析存档二进制格式，而是通过 `DocumentEngine` 加载出 `Document`，
//! 再由各 Action handler 调用 `Document` 上的类型化访问器读写。
//!
//! 可选功能（硬币、邮件、名人堂等）以 `Capability` 标识：handler 先用
//! `supports` 查询，再调用对应访问器；引擎未实现的访问器默认返回
//! `DomainError::Unsupported`。

mod snapshot;
pub mod tables;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use snapshot::SnapshotEngine;

/// 引擎层的实体视图（宝可梦、邮件、训练家资料等），字段由引擎决定
pub type Entity = serde_json::Map<String, Value>;

/// 文档可选功能
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    TrainerRecords,
    BattleFacility,
    RivalName,
    BattleBox,
    Coins,
    BattlePoints,
    HallOfFame,
    Mail,
    Ribbons,
    Badges,
    SecretBase,
    Entralink,
    FestivalPlaza,
    PokePelago,
    PokeJobs,
    SecondsToStart,
    SecondsToFame,
}

impl Capability {
    pub const ALL: [Capability; 17] = [
        Capability::TrainerRecords,
        Capability::BattleFacility,
        Capability::RivalName,
        Capability::BattleBox,
        Capability::Coins,
        Capability::BattlePoints,
        Capability::HallOfFame,
        Capability::Mail,
        Capability::Ribbons,
        Capability::Badges,
        Capability::SecretBase,
        Capability::Entralink,
        Capability::FestivalPlaza,
        Capability::PokePelago,
        Capability::PokeJobs,
        Capability::SecondsToStart,
        Capability::SecondsToFame,
    ];

    /// `features` 数组中使用的键
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TrainerRecords => "trainerRecords",
            Capability::BattleFacility => "battleFacility",
            Capability::RivalName => "rivalName",
            Capability::BattleBox => "battleBox",
            Capability::Coins => "coins",
            Capability::BattlePoints => "battlePoints",
            Capability::HallOfFame => "hallOfFame",
            Capability::Mail => "mail",
            Capability::Ribbons => "ribbons",
            Capability::Badges => "badges",
            Capability::SecretBase => "secretBase",
            Capability::Entralink => "entralink",
            Capability::FestivalPlaza => "festivalPlaza",
            Capability::PokePelago => "pokePelago",
            Capability::PokeJobs => "pokeJobs",
            Capability::SecondsToStart => "secondsToStart",
            Capability::SecondsToFame => "secondsToFame",
        }
    }

    pub fn from_key(key: &str) -> Option<Capability> {
        Capability::ALL.into_iter().find(|c| c.as_str() == key)
    }

    /// 错误信息中的人类可读名称
    pub fn label(&self) -> &'static str {
        match self {
            Capability::TrainerRecords => "Trainer records",
            Capability::BattleFacility => "Battle facility stats",
            Capability::RivalName => "Rival name",
            Capability::BattleBox => "Battle Box",
            Capability::Coins => "Coins",
            Capability::BattlePoints => "Battle Points",
            Capability::HallOfFame => "Hall of Fame",
            Capability::Mail => "Mail",
            Capability::Ribbons => "Ribbons",
            Capability::Badges => "Badges",
            Capability::SecretBase => "Secret Base",
            Capability::Entralink => "Entralink",
            Capability::FestivalPlaza => "Festival Plaza",
            Capability::PokePelago => "Poke Pelago",
            Capability::PokeJobs => "Poke Jobs",
            Capability::SecondsToStart => "Seconds to start",
            Capability::SecondsToFame => "Seconds to fame",
        }
    }
}

/// 引擎层错误；经 handler 边界转为 `{"error": ...}`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("{} not supported for this save file", .0.label())]
    Unsupported(Capability),

    #[error("Unable to load save file: {0}")]
    Unreadable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 引擎拒绝该操作（容量已满、目标不存在等）
    #[error("{0}")]
    Rejected(String),
}

/// 槽位定位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRef {
    Box { index: usize, slot: usize },
    Party(usize),
    BattleBox(usize),
}

/// 存储布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageLayout {
    pub box_count: usize,
    pub box_slot_count: usize,
    pub party_capacity: usize,
    pub party_count: usize,
    /// 无 Battle Box 的文档为 0
    pub battle_box_slots: usize,
}

/// 文档概要（loadSave / getSaveInfo 的主体字段）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub save_type: String,
    pub game: String,
    pub generation: u8,
    pub trainer_name: String,
    #[serde(rename = "trainerID")]
    pub trainer_id: u32,
    #[serde(rename = "secretID")]
    pub secret_id: u32,
    pub gender: u8,
    pub money: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayTime {
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
}

impl PlayTime {
    pub fn total_seconds(&self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStack {
    #[serde(rename = "itemId")]
    pub item: u16,
    pub count: u16,
}

/// 背包口袋
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pouch {
    pub kind: String,
    pub capacity: usize,
    #[serde(default)]
    pub items: Vec<ItemStack>,
}

/// 背包增减结果；`count` 为操作后的剩余数量（移除干净时为 0）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackChange {
    pub pouch_index: usize,
    pub slot: usize,
    pub item: u16,
    pub count: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexEntry {
    pub species: u16,
    pub seen: bool,
    pub caught: bool,
}

/// 训练家记录项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordValue {
    pub value: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexFlag {
    Seen,
    Caught,
}

/// 标量计数器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Counter {
    Coins,
    BattlePoints,
    SecondsToStart,
    SecondsToFame,
}

impl Counter {
    pub fn capability(&self) -> Capability {
        match self {
            Counter::Coins => Capability::Coins,
            Counter::BattlePoints => Capability::BattlePoints,
            Counter::SecondsToStart => Capability::SecondsToStart,
            Counter::SecondsToFame => Capability::SecondsToFame,
        }
    }
}

/// 名称表（Knowledge 类 Action 使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTable {
    Species,
    Moves,
    Abilities,
    Items,
    Natures,
    Types,
}

impl NameTable {
    /// 错误信息中使用的单数名称
    pub fn label(&self) -> &'static str {
        match self {
            NameTable::Species => "species",
            NameTable::Moves => "move",
            NameTable::Abilities => "ability",
            NameTable::Items => "item",
            NameTable::Natures => "nature",
            NameTable::Types => "type",
        }
    }
}

/// 游戏静态数据查询
pub trait GameData: Send + Sync {
    fn name(&self, table: NameTable, id: u32) -> Option<&str>;

    /// 全部条目，按 id 升序
    fn names(&self, table: NameTable) -> Vec<(u32, &str)>;
}

/// 文档引擎：把字节解析为可变文档
pub trait DocumentEngine: Send + Sync {
    fn name(&self) -> &str;

    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Document>, DomainError>;

    fn game_data(&self) -> &dyn GameData;
}

/// 已加载的可变文档。一个会话独占一个实例。
pub trait Document: Send {
    fn summary(&self) -> DocumentSummary;

    /// 序列化回字节
    fn write(&self) -> Result<Vec<u8>, DomainError>;

    fn capabilities(&self) -> Vec<Capability>;

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    // ---- 槽位 ----

    fn layout(&self) -> StorageLayout;

    /// 空槽位返回 `None`
    fn read_slot(&self, slot: SlotRef) -> Result<Option<Entity>, DomainError>;

    fn export_slot(&self, slot: SlotRef) -> Result<Option<Vec<u8>>, DomainError>;

    fn import_slot(&mut self, slot: SlotRef, bytes: &[u8]) -> Result<Entity, DomainError>;

    fn modify_slot(&mut self, slot: SlotRef, changes: &Entity) -> Result<Entity, DomainError>;

    fn clear_slot(&mut self, slot: SlotRef) -> Result<(), DomainError>;

    fn swap_slots(&mut self, a: SlotRef, b: SlotRef) -> Result<(), DomainError>;

    // ---- 盒子 ----

    fn box_name(&self, index: usize) -> String;

    fn box_wallpaper(&self, index: usize) -> u32;

    fn set_box_wallpaper(&mut self, index: usize, wallpaper: u32) -> Result<(), DomainError>;

    // ---- 训练家 ----

    fn trainer(&self) -> Entity;

    /// 应用修改，返回实际生效的字段名
    fn update_trainer(&mut self, changes: &Entity) -> Result<Vec<String>, DomainError>;

    fn play_time(&self) -> PlayTime;

    fn set_play_time(&mut self, time: PlayTime) -> Result<(), DomainError>;

    // ---- 进度 ----

    fn event_flag_count(&self) -> usize;

    fn event_flag(&self, index: usize) -> Result<bool, DomainError>;

    fn set_event_flag(&mut self, index: usize, value: bool) -> Result<(), DomainError>;

    fn event_const_count(&self) -> usize;

    fn event_const(&self, index: usize) -> Result<u16, DomainError>;

    fn set_event_const(&mut self, index: usize, value: u16) -> Result<(), DomainError>;

    // ---- 背包 / 图鉴 ----

    fn pouches(&self) -> Vec<Pouch>;

    fn add_item(&mut self, pouch: Option<usize>, item: u16, count: u16) -> Result<StackChange, DomainError>;

    fn remove_item(&mut self, item: u16, count: u16) -> Result<StackChange, DomainError>;

    /// 最大全国图鉴编号
    fn max_species(&self) -> u16;

    /// 1..=max_species 的全部条目
    fn pokedex(&self) -> Vec<DexEntry>;

    fn set_dex_flag(&mut self, species: u16, form: u8, flag: DexFlag, value: bool) -> Result<(), DomainError>;

    // ---- 可选功能（默认不支持） ----

    fn badges(&self) -> Result<Vec<bool>, DomainError> {
        Err(DomainError::Unsupported(Capability::Badges))
    }

    fn set_badge(&mut self, _index: usize, _value: bool) -> Result<(), DomainError> {
        Err(DomainError::Unsupported(Capability::Badges))
    }

    fn counter(&self, counter: Counter) -> Result<u32, DomainError> {
        Err(DomainError::Unsupported(counter.capability()))
    }

    fn set_counter(&mut self, counter: Counter, _value: u32) -> Result<(), DomainError> {
        Err(DomainError::Unsupported(counter.capability()))
    }

    fn rival_name(&self) -> Result<String, DomainError> {
        Err(DomainError::Unsupported(Capability::RivalName))
    }

    fn set_rival_name(&mut self, _name: &str) -> Result<(), DomainError> {
        Err(DomainError::Unsupported(Capability::RivalName))
    }

    fn records(&self) -> Result<Vec<RecordValue>, DomainError> {
        Err(DomainError::Unsupported(Capability::TrainerRecords))
    }

    fn set_record(&mut self, _index: usize, _value: i32) -> Result<(), DomainError> {
        Err(DomainError::Unsupported(Capability::TrainerRecords))
    }

    fn hall_of_fame(&self) -> Result<Vec<Value>, DomainError> {
        Err(DomainError::Unsupported(Capability::HallOfFame))
    }

    fn mailbox(&self) -> Result<Vec<Option<Entity>>, DomainError> {
        Err(DomainError::Unsupported(Capability::Mail))
    }

    fn delete_mail(&mut self, _index: usize) -> Result<(), DomainError> {
        Err(DomainError::Unsupported(Capability::Mail))
    }

    fn ribbons(&self, _slot: SlotRef) -> Result<BTreeMap<String, bool>, DomainError> {
        Err(DomainError::Unsupported(Capability::Ribbons))
    }

    fn set_ribbon(&mut self, _slot: SlotRef, _name: &str, _value: bool) -> Result<(), DomainError> {
        Err(DomainError::Unsupported(Capability::Ribbons))
    }

    fn facility(&self, capability: Capability) -> Result<Value, DomainError> {
        Err(DomainError::Unsupported(capability))
    }
}
