//! Items：背包口袋

use serde_json::{json, Value};

use super::narrow;
use crate::core::error::RpcError;
use crate::engine::Document;
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments, ParamSpec, ParamType};

const MAX_COUNT: i64 = 999;

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::Items;
    use ParamType::*;

    vec![
        ActionDescriptor::new(
            "getPouchItems",
            Items,
            "Get all items in the inventory organized by pouches. Returns pouchType, pouchIndex, items and totalSlots for each pouch.",
        )
        .returns("pouches", Array, "Pouch entries")
        .document(get_pouch_items),
        ActionDescriptor::new(
            "addItemToPouch",
            Items,
            "Add an item to an inventory pouch. Use getPouchItems to see available pouches and their indices.",
        )
        .param(ParamSpec::required("itemId", Integer).with_description("The item ID to add"))
        .param(
            ParamSpec::optional("count", Integer)
                .with_default(1)
                .with_description("Number of items to add (1-999)"),
        )
        .param(
            ParamSpec::optional("pouchIndex", Integer)
                .with_description("Pouch index from getPouchItems. If omitted, searches all pouches for space."),
        )
        .document(add_item_to_pouch),
        ActionDescriptor::new("removeItemFromPouch", Items, "Remove an item from the inventory.")
            .param(ParamSpec::required("itemId", Integer).with_description("The item ID to remove"))
            .param(ParamSpec::optional("count", Integer).with_default(1))
            .document(remove_item_from_pouch),
    ]
}

fn item_id(args: &Arguments) -> Result<u16, RpcError> {
    let id = args.int("itemId")?;
    if id <= 0 {
        return Err(RpcError::out_of_range("Invalid item ID"));
    }
    narrow(id, || "Invalid item ID".to_string())
}

fn get_pouch_items(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let pouches: Vec<Value> = doc
        .pouches()
        .into_iter()
        .enumerate()
        .map(|(index, pouch)| {
            json!({
                "pouchType": pouch.kind,
                "pouchIndex": index,
                "items": pouch.items,
                "totalSlots": pouch.capacity,
            })
        })
        .collect();
    Ok(json!({ "pouches": pouches }))
}

fn add_item_to_pouch(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let item = item_id(args)?;
    let count = args.int("count")?;
    if !(1..=MAX_COUNT).contains(&count) {
        return Err(RpcError::out_of_range("Count must be between 1 and 999"));
    }
    let pouch = match args.opt_int("pouchIndex") {
        Some(index) if index < 0 => {
            return Err(RpcError::out_of_range("Invalid pouch index. Must be non-negative"))
        }
        Some(index) => Some(index as usize),
        None => None,
    };

    let change = doc.add_item(pouch, item, count as u16)?;
    Ok(json!({
        "success": true,
        "message": format!(
            "Item {} in pouch {} slot {}, new count: {}",
            item, change.pouch_index, change.slot, change.count
        ),
        "pouchIndex": change.pouch_index,
        "slot": change.slot,
        "itemId": item,
        "count": change.count,
    }))
}

fn remove_item_from_pouch(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let item = item_id(args)?;
    let count = args.int("count")?;
    if count <= 0 {
        return Err(RpcError::out_of_range("Count must be greater than 0"));
    }

    let change = doc.remove_item(item, count.min(u16::MAX as i64) as u16)?;
    if change.count == 0 {
        return Ok(json!({
            "success": true,
            "message": format!("Removed item {} from inventory", item),
            "pouchIndex": change.pouch_index,
            "slot": change.slot,
            "itemId": item,
        }));
    }
    Ok(json!({
        "success": true,
        "message": format!("Decreased item {} count to {}", item, change.count),
        "pouchIndex": change.pouch_index,
        "slot": change.slot,
        "itemId": item,
        "count": change.count,
    }))
}
