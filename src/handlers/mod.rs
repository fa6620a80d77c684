//! 各分类 Action 的 handler
//!
//! 每个子模块导出 `actions()`：声明 + handler 成对给出，由 registry::catalog 汇总。
//! handler 只做参数语义校验与响应组装，存档读写全部委托给 `Document`。

pub mod communication;
pub mod items;
pub mod knowledge;
pub mod pokedex;
pub mod pokemon;
pub mod progress;
pub mod save;
pub mod storage;
pub mod trainer;
pub mod world;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::core::error::RpcError;
use crate::engine::{Capability, DomainError, Document, Entity, SlotRef};
use crate::registry::Arguments;

/// 功能不支持时直接返回 `<Feature> not supported for this save file`
pub(crate) fn require(doc: &dyn Document, capability: Capability) -> Result<(), RpcError> {
    if doc.supports(capability) {
        Ok(())
    } else {
        Err(DomainError::Unsupported(capability).into())
    }
}

/// 下标校验：`<what> index <i> out of range (0-<n-1>)`
pub(crate) fn bounded(index: i64, len: usize, what: &str) -> Result<usize, RpcError> {
    if index >= 0 && (index as u64) < len as u64 {
        Ok(index as usize)
    } else {
        Err(RpcError::out_of_range(format!(
            "{} index {} out of range (0-{})",
            what,
            index,
            len.saturating_sub(1)
        )))
    }
}

/// 盒子下标参数
pub(crate) fn box_index(doc: &dyn Document, args: &Arguments, key: &str) -> Result<usize, RpcError> {
    let count = doc.layout().box_count;
    let index = args.int(key)?;
    if index < 0 || index as u64 >= count as u64 {
        return Err(RpcError::out_of_range(format!(
            "Invalid box index. Must be between 0 and {}",
            count.saturating_sub(1)
        )));
    }
    Ok(index as usize)
}

/// 盒子槽位参数（box / slot 或 fromBox / fromSlot 等）
pub(crate) fn box_slot(
    doc: &dyn Document,
    args: &Arguments,
    box_key: &str,
    slot_key: &str,
) -> Result<SlotRef, RpcError> {
    let index = box_index(doc, args, box_key)?;
    let count = doc.layout().box_slot_count;
    let slot = args.int(slot_key)?;
    if slot < 0 || slot as u64 >= count as u64 {
        return Err(RpcError::out_of_range(format!(
            "Invalid slot index. Must be between 0 and {}",
            count.saturating_sub(1)
        )));
    }
    Ok(SlotRef::Box {
        index,
        slot: slot as usize,
    })
}

pub(crate) fn party_slot(doc: &dyn Document, args: &Arguments) -> Result<usize, RpcError> {
    let slot = args.int("slot")?;
    let capacity = doc.layout().party_capacity;
    if slot < 0 || slot as u64 >= capacity as u64 {
        return Err(RpcError::out_of_range(format!(
            "Invalid party slot: {}. Must be 0-{}",
            slot,
            capacity.saturating_sub(1)
        )));
    }
    Ok(slot as usize)
}

/// 解码 base64 参数；`what` 用于空值时的提示
pub(crate) fn decode_base64(text: &str, what: &str) -> Result<Vec<u8>, RpcError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RpcError::invalid_value(format!("{} is required", what)));
    }
    STANDARD
        .decode(text)
        .map_err(|_| RpcError::invalid_value("Invalid base64 data"))
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// 数值参数收窄到目标类型
pub(crate) fn narrow<T: TryFrom<i64>>(value: i64, message: impl FnOnce() -> String) -> Result<T, RpcError> {
    T::try_from(value).map_err(|_| RpcError::out_of_range(message()))
}

pub(crate) fn species_of(entity: &Entity) -> Value {
    entity.get("species").cloned().unwrap_or(Value::Null)
}

/// 空槽位统一表示
pub(crate) fn empty() -> Value {
    json!({ "empty": true })
}

pub(crate) fn format_seconds(total: u64) -> String {
    format!("{}h {}m {}s", total / 3600, (total % 3600) / 60, total % 60)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_message() {
        assert_eq!(bounded(2, 3, "Mail").unwrap(), 2);
        assert_eq!(
            bounded(3, 3, "Mail").unwrap_err().to_string(),
            "Mail index 3 out of range (0-2)"
        );
        assert!(bounded(-1, 3, "Mail").is_err());
    }

    #[test]
    fn test_decode_base64() {
        assert_eq!(decode_base64("aGk=", "Data").unwrap(), b"hi".to_vec());
        assert_eq!(
            decode_base64("", "Base64 save data").unwrap_err().to_string(),
            "Base64 save data is required"
        );
        assert_eq!(
            decode_base64("!!not base64!!", "Data").unwrap_err().to_string(),
            "Invalid base64 data"
        );
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(3725), "1h 2m 5s");
    }
}
