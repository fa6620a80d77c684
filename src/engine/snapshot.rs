//! 内置参考引擎：JSON 快照文档
//!
//! 快照是一份 UTF-8 JSON（`"format": "savehub-snapshot/1"`），字段覆盖
//! 网关暴露的全部访问器。可选区块缺省即视为该存档不具备对应功能。
//! 实体（宝可梦、邮件）保持为 JSON 对象，导出字节即其 JSON 编码。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tables::StaticGameData;
use super::{
    Capability, Counter, DexEntry, DexFlag, Document, DocumentEngine, DocumentSummary,
    DomainError, Entity, GameData, ItemStack, PlayTime, Pouch, RecordValue, SlotRef,
    StackChange, StorageLayout,
};

pub const SNAPSHOT_FORMAT: &str = "savehub-snapshot/1";

const PARTY_CAPACITY: usize = 6;
const MAX_STACK: u16 = 999;

const RIBBON_NAMES: &[&str] = &[
    "RibbonChampionG3",
    "RibbonWinning",
    "RibbonVictory",
    "RibbonArtist",
    "RibbonEffort",
    "RibbonNational",
    "RibbonEarth",
    "RibbonWorld",
    "RibbonClassic",
    "RibbonPremier",
    "RibbonEvent",
    "RibbonBirthday",
    "RibbonSpecial",
    "RibbonSouvenir",
    "RibbonWishing",
    "RibbonBestFriends",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TrainerProfile {
    #[serde(rename = "trainerName")]
    name: String,
    #[serde(rename = "trainerID")]
    id: u32,
    #[serde(rename = "secretID", default)]
    secret_id: u32,
    #[serde(default)]
    gender: u8,
    #[serde(default)]
    money: u32,
    #[serde(default)]
    language: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StorageBox {
    name: String,
    #[serde(default)]
    wallpaper: u32,
    slots: Vec<Option<Entity>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    format: String,
    #[serde(default = "default_save_type")]
    save_type: String,
    game: String,
    generation: u8,
    trainer: TrainerProfile,
    #[serde(default)]
    play_time: PlayTime,
    boxes: Vec<StorageBox>,
    /// 紧凑排列，长度即队伍数量
    #[serde(default)]
    party: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    battle_box: Option<Vec<Option<Entity>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    badges: Option<Vec<bool>>,
    #[serde(default)]
    counters: BTreeMap<Counter, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rival_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    records: Option<Vec<RecordValue>>,
    #[serde(default)]
    event_flags: Vec<bool>,
    #[serde(default)]
    event_consts: Vec<u16>,
    #[serde(default)]
    pouches: Vec<Pouch>,
    #[serde(default = "StaticGameData::max_species")]
    max_species: u16,
    /// 稀疏：仅记录见过或捕获过的物种
    #[serde(default)]
    pokedex: Vec<DexEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hall_of_fame: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mailbox: Option<Vec<Option<Entity>>>,
    #[serde(default)]
    facilities: BTreeMap<Capability, Value>,
}

fn default_save_type() -> String {
    "SnapshotSave".to_string()
}

fn species_of(entity: &Entity) -> Option<u64> {
    entity.get("species").and_then(Value::as_u64)
}

fn validate_entity(entity: &Entity) -> Result<(), DomainError> {
    match species_of(entity) {
        Some(species) if species > 0 => Ok(()),
        _ => Err(DomainError::InvalidData(
            "entity requires a positive species".to_string(),
        )),
    }
}

fn parse_entity(bytes: &[u8]) -> Result<Entity, DomainError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| DomainError::InvalidData(format!("entity is not JSON: {}", e)))?;
    let Value::Object(entity) = value else {
        return Err(DomainError::InvalidData(
            "entity must be a JSON object".to_string(),
        ));
    };
    validate_entity(&entity)?;
    Ok(entity)
}

fn index_error(what: &str, index: usize, len: usize) -> DomainError {
    DomainError::Rejected(format!(
        "{} index {} out of range (0-{})",
        what,
        index,
        len.saturating_sub(1)
    ))
}

/// 快照引擎
#[derive(Debug, Default, Clone)]
pub struct SnapshotEngine {
    data: StaticGameData,
}

impl SnapshotEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentEngine for SnapshotEngine {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Document>, DomainError> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)
            .map_err(|e| DomainError::Unreadable(e.to_string()))?;
        SnapshotDocument::new(snapshot).map(|doc| Box::new(doc) as Box<dyn Document>)
    }

    fn game_data(&self) -> &dyn GameData {
        &self.data
    }
}

/// 已加载的快照文档
#[derive(Debug, Clone)]
pub struct SnapshotDocument {
    snapshot: Snapshot,
}

impl SnapshotDocument {
    fn new(snapshot: Snapshot) -> Result<Self, DomainError> {
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(DomainError::Unreadable(format!(
                "unsupported format '{}'",
                snapshot.format
            )));
        }
        let slot_count = snapshot.boxes.first().map(|b| b.slots.len()).unwrap_or(0);
        if slot_count == 0 || snapshot.boxes.iter().any(|b| b.slots.len() != slot_count) {
            return Err(DomainError::Unreadable(
                "boxes must be non-empty and share one slot count".to_string(),
            ));
        }
        if snapshot.party.len() > PARTY_CAPACITY {
            return Err(DomainError::Unreadable(format!(
                "party holds at most {} entries",
                PARTY_CAPACITY
            )));
        }

        let boxed = snapshot.boxes.iter().flat_map(|b| b.slots.iter().flatten());
        let battle = snapshot.battle_box.iter().flat_map(|b| b.iter().flatten());
        for entity in boxed.chain(battle).chain(snapshot.party.iter()) {
            validate_entity(entity).map_err(|e| DomainError::Unreadable(e.to_string()))?;
        }

        Ok(Self { snapshot })
    }

    fn has(&self, capability: Capability) -> bool {
        let s = &self.snapshot;
        match capability {
            Capability::TrainerRecords => s.records.is_some(),
            Capability::RivalName => s.rival_name.is_some(),
            Capability::BattleBox => s.battle_box.is_some(),
            Capability::HallOfFame => s.hall_of_fame.is_some(),
            Capability::Mail => s.mailbox.is_some(),
            Capability::Ribbons => s.generation >= 3,
            Capability::Badges => s.badges.is_some(),
            Capability::Coins => s.counters.contains_key(&Counter::Coins),
            Capability::BattlePoints => s.counters.contains_key(&Counter::BattlePoints),
            Capability::SecondsToStart => s.counters.contains_key(&Counter::SecondsToStart),
            Capability::SecondsToFame => s.counters.contains_key(&Counter::SecondsToFame),
            Capability::BattleFacility
            | Capability::SecretBase
            | Capability::Entralink
            | Capability::FestivalPlaza
            | Capability::PokePelago
            | Capability::PokeJobs => s.facilities.contains_key(&capability),
        }
    }

    /// 盒子与 Battle Box 槽位
    fn cell(&mut self, slot: SlotRef) -> Result<&mut Option<Entity>, DomainError> {
        match slot {
            SlotRef::Box { index, slot } => {
                let count = self.snapshot.boxes.len();
                let storage = self
                    .snapshot
                    .boxes
                    .get_mut(index)
                    .ok_or_else(|| index_error("Box", index, count))?;
                let slots = storage.slots.len();
                storage
                    .slots
                    .get_mut(slot)
                    .ok_or_else(|| index_error("Slot", slot, slots))
            }
            SlotRef::BattleBox(slot) => {
                let battle = self
                    .snapshot
                    .battle_box
                    .as_mut()
                    .ok_or(DomainError::Unsupported(Capability::BattleBox))?;
                let slots = battle.len();
                battle
                    .get_mut(slot)
                    .ok_or_else(|| index_error("Battle Box slot", slot, slots))
            }
            SlotRef::Party(_) => Err(DomainError::Rejected(
                "party slots are not addressable as cells".to_string(),
            )),
        }
    }

    fn occupied(&mut self, slot: SlotRef) -> Result<&mut Entity, DomainError> {
        let entity = match slot {
            SlotRef::Party(index) => self.snapshot.party.get_mut(index),
            other => self.cell(other)?.as_mut(),
        };
        entity.ok_or_else(|| DomainError::Rejected("No Pokemon in this slot".to_string()))
    }

    fn put(&mut self, slot: SlotRef, entity: Entity) -> Result<(), DomainError> {
        match slot {
            SlotRef::Party(index) => {
                if index >= PARTY_CAPACITY {
                    return Err(index_error("Party slot", index, PARTY_CAPACITY));
                }
                let party = &mut self.snapshot.party;
                if index < party.len() {
                    party[index] = entity;
                } else {
                    // 队伍紧凑排列，越过末尾的写入追加到末尾
                    party.push(entity);
                }
            }
            other => *self.cell(other)? = Some(entity),
        }
        Ok(())
    }

    fn peek(&self, slot: SlotRef) -> Result<Option<&Entity>, DomainError> {
        let s = &self.snapshot;
        match slot {
            SlotRef::Box { index, slot } => {
                let storage = s
                    .boxes
                    .get(index)
                    .ok_or_else(|| index_error("Box", index, s.boxes.len()))?;
                storage
                    .slots
                    .get(slot)
                    .map(Option::as_ref)
                    .ok_or_else(|| index_error("Slot", slot, storage.slots.len()))
            }
            SlotRef::Party(index) => Ok(s.party.get(index)),
            SlotRef::BattleBox(slot) => {
                let battle = s
                    .battle_box
                    .as_ref()
                    .ok_or(DomainError::Unsupported(Capability::BattleBox))?;
                battle
                    .get(slot)
                    .map(Option::as_ref)
                    .ok_or_else(|| index_error("Battle Box slot", slot, battle.len()))
            }
        }
    }

    fn dex_entry_mut(&mut self, species: u16) -> &mut DexEntry {
        let dex = &mut self.snapshot.pokedex;
        let position = match dex.iter().position(|e| e.species == species) {
            Some(position) => position,
            None => {
                dex.push(DexEntry {
                    species,
                    seen: false,
                    caught: false,
                });
                dex.len() - 1
            }
        };
        &mut dex[position]
    }

    fn stack_into(pouch: &mut Pouch, pouch_index: usize, item: u16, count: u16) -> Option<StackChange> {
        if let Some(slot) = pouch.items.iter().position(|s| s.item == item) {
            let stack = &mut pouch.items[slot];
            stack.count = stack.count.saturating_add(count).min(MAX_STACK);
            return Some(StackChange {
                pouch_index,
                slot,
                item,
                count: stack.count,
            });
        }
        if pouch.items.len() < pouch.capacity {
            let count = count.min(MAX_STACK);
            pouch.items.push(ItemStack { item, count });
            return Some(StackChange {
                pouch_index,
                slot: pouch.items.len() - 1,
                item,
                count,
            });
        }
        None
    }
}

impl Document for SnapshotDocument {
    fn summary(&self) -> DocumentSummary {
        let s = &self.snapshot;
        DocumentSummary {
            save_type: s.save_type.clone(),
            game: s.game.clone(),
            generation: s.generation,
            trainer_name: s.trainer.name.clone(),
            trainer_id: s.trainer.id,
            secret_id: s.trainer.secret_id,
            gender: s.trainer.gender,
            money: s.trainer.money,
        }
    }

    fn write(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec_pretty(&self.snapshot).map_err(|e| DomainError::InvalidData(e.to_string()))
    }

    fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL.into_iter().filter(|c| self.has(*c)).collect()
    }

    fn layout(&self) -> StorageLayout {
        let s = &self.snapshot;
        StorageLayout {
            box_count: s.boxes.len(),
            box_slot_count: s.boxes.first().map(|b| b.slots.len()).unwrap_or(0),
            party_capacity: PARTY_CAPACITY,
            party_count: s.party.len(),
            battle_box_slots: s.battle_box.as_ref().map(Vec::len).unwrap_or(0),
        }
    }

    fn read_slot(&self, slot: SlotRef) -> Result<Option<Entity>, DomainError> {
        Ok(self.peek(slot)?.cloned())
    }

    fn export_slot(&self, slot: SlotRef) -> Result<Option<Vec<u8>>, DomainError> {
        match self.peek(slot)? {
            Some(entity) => serde_json::to_vec(entity)
                .map(Some)
                .map_err(|e| DomainError::InvalidData(e.to_string())),
            None => Ok(None),
        }
    }

    fn import_slot(&mut self, slot: SlotRef, bytes: &[u8]) -> Result<Entity, DomainError> {
        let entity = parse_entity(bytes)?;
        self.put(slot, entity.clone())?;
        Ok(entity)
    }

    fn modify_slot(&mut self, slot: SlotRef, changes: &Entity) -> Result<Entity, DomainError> {
        let entity = self.occupied(slot)?;
        let mut updated = entity.clone();
        for (key, value) in changes {
            updated.insert(key.clone(), value.clone());
        }
        validate_entity(&updated)?;
        *entity = updated.clone();
        Ok(updated)
    }

    fn clear_slot(&mut self, slot: SlotRef) -> Result<(), DomainError> {
        match slot {
            SlotRef::Party(index) => {
                if index >= self.snapshot.party.len() {
                    return Err(DomainError::Rejected("Slot is already empty".to_string()));
                }
                self.snapshot.party.remove(index);
            }
            other => *self.cell(other)? = None,
        }
        Ok(())
    }

    fn swap_slots(&mut self, a: SlotRef, b: SlotRef) -> Result<(), DomainError> {
        if a == b {
            return Ok(());
        }
        // 先校验两端，避免半途失败
        self.cell(a)?;
        self.cell(b)?;
        let first = self.cell(a)?.take();
        let second = std::mem::replace(self.cell(b)?, first);
        *self.cell(a)? = second;
        Ok(())
    }

    fn box_name(&self, index: usize) -> String {
        self.snapshot
            .boxes
            .get(index)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| format!("Box {}", index + 1))
    }

    fn box_wallpaper(&self, index: usize) -> u32 {
        self.snapshot.boxes.get(index).map(|b| b.wallpaper).unwrap_or(0)
    }

    fn set_box_wallpaper(&mut self, index: usize, wallpaper: u32) -> Result<(), DomainError> {
        let count = self.snapshot.boxes.len();
        let storage = self
            .snapshot
            .boxes
            .get_mut(index)
            .ok_or_else(|| index_error("Box", index, count))?;
        storage.wallpaper = wallpaper;
        Ok(())
    }

    fn trainer(&self) -> Entity {
        match serde_json::to_value(&self.snapshot.trainer) {
            Ok(Value::Object(map)) => map,
            _ => Entity::new(),
        }
    }

    fn update_trainer(&mut self, changes: &Entity) -> Result<Vec<String>, DomainError> {
        let invalid = |key: &str| DomainError::InvalidData(format!("{} has an invalid value", key));
        let as_u32 = |key: &str, value: &Value| {
            value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| invalid(key))
        };

        // 先在副本上应用，全部成功后再提交
        let mut trainer = self.snapshot.trainer.clone();
        let mut applied = Vec::new();
        for (name, value) in changes {
            let key = name.as_str();
            match key.to_lowercase().as_str() {
                "trainername" => {
                    trainer.name = value.as_str().ok_or_else(|| invalid(key))?.to_string();
                }
                "trainerid" => trainer.id = as_u32(key, value)?,
                "secretid" => trainer.secret_id = as_u32(key, value)?,
                "gender" => {
                    trainer.gender = u8::try_from(as_u32(key, value)?).map_err(|_| invalid(key))?;
                }
                "money" => trainer.money = as_u32(key, value)?,
                _ => continue,
            }
            applied.push(name.clone());
        }
        self.snapshot.trainer = trainer;
        Ok(applied)
    }

    fn play_time(&self) -> PlayTime {
        self.snapshot.play_time
    }

    fn set_play_time(&mut self, time: PlayTime) -> Result<(), DomainError> {
        self.snapshot.play_time = time;
        Ok(())
    }

    fn event_flag_count(&self) -> usize {
        self.snapshot.event_flags.len()
    }

    fn event_flag(&self, index: usize) -> Result<bool, DomainError> {
        let flags = &self.snapshot.event_flags;
        flags
            .get(index)
            .copied()
            .ok_or_else(|| index_error("Event flag", index, flags.len()))
    }

    fn set_event_flag(&mut self, index: usize, value: bool) -> Result<(), DomainError> {
        let flags = &mut self.snapshot.event_flags;
        let len = flags.len();
        let flag = flags.get_mut(index).ok_or_else(|| index_error("Event flag", index, len))?;
        *flag = value;
        Ok(())
    }

    fn event_const_count(&self) -> usize {
        self.snapshot.event_consts.len()
    }

    fn event_const(&self, index: usize) -> Result<u16, DomainError> {
        let consts = &self.snapshot.event_consts;
        consts
            .get(index)
            .copied()
            .ok_or_else(|| index_error("Event const", index, consts.len()))
    }

    fn set_event_const(&mut self, index: usize, value: u16) -> Result<(), DomainError> {
        let consts = &mut self.snapshot.event_consts;
        let len = consts.len();
        let slot = consts.get_mut(index).ok_or_else(|| index_error("Event const", index, len))?;
        *slot = value;
        Ok(())
    }

    fn pouches(&self) -> Vec<Pouch> {
        self.snapshot.pouches.clone()
    }

    fn add_item(&mut self, pouch: Option<usize>, item: u16, count: u16) -> Result<StackChange, DomainError> {
        let pouches = &mut self.snapshot.pouches;
        match pouch {
            Some(index) => {
                let len = pouches.len();
                let target = pouches.get_mut(index).ok_or_else(|| {
                    DomainError::Rejected(format!(
                        "Invalid pouch index. Must be 0-{}",
                        len.saturating_sub(1)
                    ))
                })?;
                Self::stack_into(target, index, item, count).ok_or_else(|| {
                    DomainError::Rejected(format!("No empty slots available in pouch {}", index))
                })
            }
            None => pouches
                .iter_mut()
                .enumerate()
                .find_map(|(index, target)| Self::stack_into(target, index, item, count))
                .ok_or_else(|| {
                    DomainError::Rejected("No empty slots available in any pouch".to_string())
                }),
        }
    }

    fn remove_item(&mut self, item: u16, count: u16) -> Result<StackChange, DomainError> {
        for (pouch_index, pouch) in self.snapshot.pouches.iter_mut().enumerate() {
            if let Some(slot) = pouch.items.iter().position(|s| s.item == item) {
                let remaining = pouch.items[slot].count.saturating_sub(count);
                if remaining == 0 {
                    pouch.items.remove(slot);
                } else {
                    pouch.items[slot].count = remaining;
                }
                return Ok(StackChange {
                    pouch_index,
                    slot,
                    item,
                    count: remaining,
                });
            }
        }
        Err(DomainError::Rejected(format!(
            "Item {} not found in inventory",
            item
        )))
    }

    fn max_species(&self) -> u16 {
        self.snapshot.max_species
    }

    fn pokedex(&self) -> Vec<DexEntry> {
        let known: BTreeMap<u16, &DexEntry> =
            self.snapshot.pokedex.iter().map(|e| (e.species, e)).collect();
        (1..=self.snapshot.max_species)
            .map(|species| match known.get(&species) {
                Some(entry) => **entry,
                None => DexEntry {
                    species,
                    seen: false,
                    caught: false,
                },
            })
            .collect()
    }

    // 快照不区分形态
    fn set_dex_flag(&mut self, species: u16, _form: u8, flag: DexFlag, value: bool) -> Result<(), DomainError> {
        let max = self.snapshot.max_species;
        if species == 0 || species > max {
            return Err(DomainError::Rejected(format!(
                "Invalid species ID. Must be between 1 and {}",
                max
            )));
        }
        let entry = self.dex_entry_mut(species);
        match flag {
            DexFlag::Seen => entry.seen = value,
            DexFlag::Caught => entry.caught = value,
        }
        Ok(())
    }

    fn badges(&self) -> Result<Vec<bool>, DomainError> {
        self.snapshot
            .badges
            .clone()
            .ok_or(DomainError::Unsupported(Capability::Badges))
    }

    fn set_badge(&mut self, index: usize, value: bool) -> Result<(), DomainError> {
        let badges = self
            .snapshot
            .badges
            .as_mut()
            .ok_or(DomainError::Unsupported(Capability::Badges))?;
        let len = badges.len();
        let badge = badges.get_mut(index).ok_or_else(|| {
            DomainError::Rejected(format!(
                "Badge index must be between 0 and {}",
                len.saturating_sub(1)
            ))
        })?;
        *badge = value;
        Ok(())
    }

    fn counter(&self, counter: Counter) -> Result<u32, DomainError> {
        self.snapshot
            .counters
            .get(&counter)
            .copied()
            .ok_or(DomainError::Unsupported(counter.capability()))
    }

    fn set_counter(&mut self, counter: Counter, value: u32) -> Result<(), DomainError> {
        let slot = self
            .snapshot
            .counters
            .get_mut(&counter)
            .ok_or(DomainError::Unsupported(counter.capability()))?;
        *slot = value;
        Ok(())
    }

    fn rival_name(&self) -> Result<String, DomainError> {
        self.snapshot
            .rival_name
            .clone()
            .ok_or(DomainError::Unsupported(Capability::RivalName))
    }

    fn set_rival_name(&mut self, name: &str) -> Result<(), DomainError> {
        let rival = self
            .snapshot
            .rival_name
            .as_mut()
            .ok_or(DomainError::Unsupported(Capability::RivalName))?;
        *rival = name.to_string();
        Ok(())
    }

    fn records(&self) -> Result<Vec<RecordValue>, DomainError> {
        self.snapshot
            .records
            .clone()
            .ok_or(DomainError::Unsupported(Capability::TrainerRecords))
    }

    fn set_record(&mut self, index: usize, value: i32) -> Result<(), DomainError> {
        let records = self
            .snapshot
            .records
            .as_mut()
            .ok_or(DomainError::Unsupported(Capability::TrainerRecords))?;
        let len = records.len();
        let record = records.get_mut(index).ok_or_else(|| index_error("Record", index, len))?;
        if value > record.max {
            return Err(DomainError::Rejected(format!(
                "Value {} exceeds maximum {} for record index {}",
                value, record.max, index
            )));
        }
        record.value = value;
        Ok(())
    }

    fn hall_of_fame(&self) -> Result<Vec<Value>, DomainError> {
        self.snapshot
            .hall_of_fame
            .clone()
            .ok_or(DomainError::Unsupported(Capability::HallOfFame))
    }

    fn mailbox(&self) -> Result<Vec<Option<Entity>>, DomainError> {
        self.snapshot
            .mailbox
            .clone()
            .ok_or(DomainError::Unsupported(Capability::Mail))
    }

    fn delete_mail(&mut self, index: usize) -> Result<(), DomainError> {
        let mailbox = self
            .snapshot
            .mailbox
            .as_mut()
            .ok_or(DomainError::Unsupported(Capability::Mail))?;
        let len = mailbox.len();
        let mail = mailbox.get_mut(index).ok_or_else(|| index_error("Mail", index, len))?;
        *mail = None;
        Ok(())
    }

    fn ribbons(&self, slot: SlotRef) -> Result<BTreeMap<String, bool>, DomainError> {
        if !self.has(Capability::Ribbons) {
            return Err(DomainError::Unsupported(Capability::Ribbons));
        }
        let entity = self
            .peek(slot)?
            .ok_or_else(|| DomainError::Rejected("No Pokemon in this slot".to_string()))?;
        let owned = entity.get("ribbons").and_then(Value::as_object);
        Ok(RIBBON_NAMES
            .iter()
            .map(|name| {
                let has = owned
                    .and_then(|r| r.get(*name))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                (name.to_string(), has)
            })
            .collect())
    }

    fn set_ribbon(&mut self, slot: SlotRef, name: &str, value: bool) -> Result<(), DomainError> {
        if !self.has(Capability::Ribbons) {
            return Err(DomainError::Unsupported(Capability::Ribbons));
        }
        if !RIBBON_NAMES.contains(&name) {
            return Err(DomainError::Rejected(format!(
                "Ribbon '{}' not found for this Pokemon",
                name
            )));
        }
        let entity = self.occupied(slot)?;
        let ribbons = entity
            .entry("ribbons")
            .or_insert_with(|| Value::Object(Entity::new()));
        if !ribbons.is_object() {
            *ribbons = Value::Object(Entity::new());
        }
        if let Value::Object(map) = ribbons {
            map.insert(name.to_string(), Value::Bool(value));
        }
        Ok(())
    }

    fn facility(&self, capability: Capability) -> Result<Value, DomainError> {
        self.snapshot
            .facilities
            .get(&capability)
            .cloned()
            .ok_or(DomainError::Unsupported(capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "format": SNAPSHOT_FORMAT,
            "game": "BW",
            "generation": 5,
            "trainer": { "trainerName": "ASH", "trainerID": 12345, "secretID": 54321, "money": 3000 },
            "playTime": { "hours": 12, "minutes": 30, "seconds": 5 },
            "boxes": [
                { "name": "Box 1", "slots": [ { "species": 25, "nickname": "PIKACHU", "level": 5 }, null, null ] },
                { "name": "Travel", "wallpaper": 3, "slots": [ null, null, null ] }
            ],
            "party": [ { "species": 4, "level": 7 } ],
            "battleBox": [ null, null ],
            "counters": { "battlePoints": 10, "secondsToStart": 100, "secondsToFame": 0 },
            "records": [ { "value": 3, "max": 999 } ],
            "eventFlags": [ false, true ],
            "eventConsts": [ 0, 7 ],
            "pouches": [ { "kind": "Items", "capacity": 2, "items": [ { "itemId": 17, "count": 3 } ] } ],
            "maxSpecies": 10,
            "pokedex": [ { "species": 4, "seen": true, "caught": true } ],
            "facilities": { "entralink": { "level": 2 } }
        })
    }

    fn load(value: Value) -> Box<dyn Document> {
        let bytes = serde_json::to_vec(&value).unwrap();
        SnapshotEngine::new().load(&bytes).unwrap()
    }

    #[test]
    fn test_load_and_summary() {
        let doc = load(sample());
        let summary = doc.summary();
        assert_eq!(summary.trainer_name, "ASH");
        assert_eq!(summary.generation, 5);
        assert_eq!(summary.save_type, "SnapshotSave");

        let layout = doc.layout();
        assert_eq!(layout.box_count, 2);
        assert_eq!(layout.box_slot_count, 3);
        assert_eq!(layout.party_count, 1);
        assert_eq!(layout.battle_box_slots, 2);
    }

    #[test]
    fn test_capabilities_follow_present_sections() {
        let doc = load(sample());
        let caps = doc.capabilities();
        assert!(caps.contains(&Capability::BattleBox));
        assert!(caps.contains(&Capability::BattlePoints));
        assert!(caps.contains(&Capability::Ribbons));
        assert!(caps.contains(&Capability::Entralink));
        assert!(!caps.contains(&Capability::Coins));
        assert!(!caps.contains(&Capability::Mail));
        assert_eq!(
            doc.counter(Counter::Coins),
            Err(DomainError::Unsupported(Capability::Coins))
        );
    }

    #[test]
    fn test_rejects_foreign_bytes() {
        let engine = SnapshotEngine::new();
        assert!(matches!(engine.load(b"\x00\x01binary"), Err(DomainError::Unreadable(_))));

        let mut wrong = sample();
        wrong["format"] = json!("other/9");
        let bytes = serde_json::to_vec(&wrong).unwrap();
        assert!(matches!(engine.load(&bytes), Err(DomainError::Unreadable(_))));
    }

    #[test]
    fn test_swap_and_clear_box_slots() {
        let mut doc = load(sample());
        let a = SlotRef::Box { index: 0, slot: 0 };
        let b = SlotRef::Box { index: 1, slot: 2 };
        doc.swap_slots(a, b).unwrap();
        assert!(doc.read_slot(a).unwrap().is_none());
        assert_eq!(doc.read_slot(b).unwrap().unwrap()["species"], json!(25));

        doc.clear_slot(b).unwrap();
        assert!(doc.read_slot(b).unwrap().is_none());
    }

    #[test]
    fn test_import_rejects_empty_species() {
        let mut doc = load(sample());
        let slot = SlotRef::Box { index: 0, slot: 1 };
        let err = doc.import_slot(slot, br#"{"species":0}"#).unwrap_err();
        assert!(matches!(err, DomainError::InvalidData(_)));

        let entity = doc.import_slot(slot, br#"{"species":7,"level":9}"#).unwrap();
        assert_eq!(entity["level"], json!(9));
        assert_eq!(doc.export_slot(slot).unwrap().unwrap(), br#"{"species":7,"level":9}"#.to_vec());
    }

    #[test]
    fn test_party_is_compact() {
        let mut doc = load(sample());
        doc.import_slot(SlotRef::Party(5), br#"{"species":1}"#).unwrap();
        assert_eq!(doc.layout().party_count, 2);
        assert_eq!(doc.read_slot(SlotRef::Party(1)).unwrap().unwrap()["species"], json!(1));

        doc.clear_slot(SlotRef::Party(0)).unwrap();
        assert_eq!(doc.read_slot(SlotRef::Party(0)).unwrap().unwrap()["species"], json!(1));
        assert!(matches!(
            doc.clear_slot(SlotRef::Party(3)),
            Err(DomainError::Rejected(_))
        ));
    }

    #[test]
    fn test_items_stack_then_fill() {
        let mut doc = load(sample());
        let stacked = doc.add_item(None, 17, 5).unwrap();
        assert_eq!((stacked.slot, stacked.count), (0, 8));

        let added = doc.add_item(Some(0), 4, 2000).unwrap();
        assert_eq!((added.slot, added.count), (1, MAX_STACK));

        // 口袋容量为 2，已满
        assert!(doc.add_item(None, 1, 1).is_err());

        let removed = doc.remove_item(17, 8).unwrap();
        assert_eq!(removed.count, 0);
        assert_eq!(doc.pouches()[0].items.len(), 1);
        assert!(doc.remove_item(17, 1).is_err());
    }

    #[test]
    fn test_pokedex_dense_view() {
        let mut doc = load(sample());
        let dex = doc.pokedex();
        assert_eq!(dex.len(), 10);
        assert!(dex[3].caught);

        doc.set_dex_flag(7, 0, DexFlag::Seen, true).unwrap();
        assert!(doc.pokedex()[6].seen);
        assert!(doc.set_dex_flag(11, 0, DexFlag::Caught, true).is_err());
    }

    #[test]
    fn test_records_respect_max() {
        let mut doc = load(sample());
        doc.set_record(0, 50).unwrap();
        assert_eq!(doc.records().unwrap()[0].value, 50);
        assert!(doc.set_record(0, 1000).is_err());
        assert!(doc.set_record(3, 1).is_err());
    }

    #[test]
    fn test_ribbons() {
        let mut doc = load(sample());
        let slot = SlotRef::Box { index: 0, slot: 0 };
        doc.set_ribbon(slot, "RibbonClassic", true).unwrap();
        let ribbons = doc.ribbons(slot).unwrap();
        assert_eq!(ribbons.get("RibbonClassic"), Some(&true));
        assert_eq!(ribbons.values().filter(|v| **v).count(), 1);
        assert!(doc.set_ribbon(slot, "RibbonMadeUp", true).is_err());
    }

    #[test]
    fn test_write_round_trips_mutations() {
        let mut doc = load(sample());
        doc.set_event_flag(0, true).unwrap();
        let bytes = doc.write().unwrap();
        let reloaded = SnapshotEngine::new().load(&bytes).unwrap();
        assert_eq!(reloaded.event_flag(0), Ok(true));
    }
}
