//! Pokemon：盒子与队伍中的宝可梦、缎带

use serde_json::{json, Value};

use super::{box_slot, decode_base64, empty, party_slot, require, species_of};
use crate::core::error::RpcError;
use crate::engine::{Capability, Document, SlotRef};
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments, ParamSpec, ParamType};

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::Pokemon;
    use ParamType::*;

    let box_param = || ParamSpec::required("box", Integer).with_description("Box index (0-based)");
    let slot_param = || ParamSpec::required("slot", Integer).with_description("Slot index (0-based)");
    let data_param = || {
        ParamSpec::required("data", String)
            .with_format("base64")
            .with_description("Base64-encoded Pokemon data")
    };

    vec![
        ActionDescriptor::new("getPokemon", Pokemon, "Get detailed information about a specific Pokemon.")
            .param(box_param())
            .param(slot_param())
            .document(get_pokemon),
        ActionDescriptor::new("getAllPokemon", Pokemon, "Get a list of all non-empty Pokemon in boxes.")
            .returns("pokemon", Array, "Entries of box, slot and pokemon")
            .returns("count", Integer, "Number of entries")
            .document(get_all_pokemon),
        ActionDescriptor::new("setPokemon", Pokemon, "Replace a Pokemon with binary data.")
            .param(box_param())
            .param(slot_param())
            .param(data_param())
            .document(set_pokemon),
        ActionDescriptor::new("modifyPokemon", Pokemon, "Modify specific Pokemon properties.")
            .param(box_param())
            .param(slot_param())
            .param(ParamSpec::required("modifications", Object).with_description("Properties to overwrite"))
            .document(modify_pokemon),
        ActionDescriptor::new("deletePokemon", Pokemon, "Clear a box slot.")
            .param(box_param())
            .param(slot_param())
            .document(delete_pokemon),
        ActionDescriptor::new("movePokemon", Pokemon, "Move or swap Pokemon between slots.")
            .param(ParamSpec::required("fromBox", Integer))
            .param(ParamSpec::required("fromSlot", Integer))
            .param(ParamSpec::required("toBox", Integer))
            .param(ParamSpec::required("toSlot", Integer))
            .document(move_pokemon),
        ActionDescriptor::new("getParty", Pokemon, "Get all Pokemon in the party.")
            .returns("party", Array, "Entries of slot and pokemon")
            .returns("count", Integer, "Party size")
            .document(get_party),
        ActionDescriptor::new("getPartySlot", Pokemon, "Get detailed information about a specific party slot.")
            .param(ParamSpec::required("slot", Integer).with_description("Party slot (0-5)"))
            .document(get_party_slot),
        ActionDescriptor::new("setPartySlot", Pokemon, "Replace a Pokemon in a party slot with binary data.")
            .param(ParamSpec::required("slot", Integer).with_description("Party slot (0-5)"))
            .param(data_param())
            .document(set_party_slot),
        ActionDescriptor::new("deletePartySlot", Pokemon, "Remove a Pokemon from the party.")
            .param(ParamSpec::required("slot", Integer).with_description("Party slot (0-5)"))
            .document(delete_party_slot),
        ActionDescriptor::new("getRibbons", Pokemon, "Get ribbons for a Pokemon.")
            .param(box_param())
            .param(slot_param())
            .returns("ribbonCount", Integer, "Number of ribbons obtained")
            .returns("ribbons", Array, "Entries of name and hasRibbon")
            .document(get_ribbons),
        ActionDescriptor::new("setRibbon", Pokemon, "Set a ribbon for a Pokemon.")
            .param(box_param())
            .param(slot_param())
            .param(ParamSpec::required("ribbonName", String))
            .param(ParamSpec::optional("value", Boolean).with_default(false))
            .document(set_ribbon),
        ActionDescriptor::new("getRibbonCount", Pokemon, "Get total ribbon count for a Pokemon.")
            .param(box_param())
            .param(slot_param())
            .document(get_ribbon_count),
    ]
}

fn ok(message: &str) -> Value {
    json!({ "success": true, "message": message })
}

fn get_pokemon(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let slot = box_slot(doc, args, "box", "slot")?;
    Ok(doc.read_slot(slot)?.map(Value::Object).unwrap_or_else(empty))
}

fn get_all_pokemon(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let layout = doc.layout();
    let mut pokemon = Vec::new();
    for index in 0..layout.box_count {
        for slot in 0..layout.box_slot_count {
            if let Some(entity) = doc.read_slot(SlotRef::Box { index, slot })? {
                pokemon.push(json!({ "box": index, "slot": slot, "pokemon": entity }));
            }
        }
    }
    Ok(json!({ "count": pokemon.len(), "pokemon": pokemon }))
}

fn set_pokemon(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let slot = box_slot(doc, args, "box", "slot")?;
    let bytes = decode_base64(args.str("data")?, "Pokemon data")?;
    doc.import_slot(slot, &bytes)?;
    Ok(ok("Pokemon updated successfully"))
}

fn modify_pokemon(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let slot = box_slot(doc, args, "box", "slot")?;
    if doc.read_slot(slot)?.is_none() {
        return Err(RpcError::invalid_value("No Pokemon in this slot"));
    }
    let updated = doc.modify_slot(slot, args.object("modifications")?)?;
    Ok(json!({
        "success": true,
        "message": "Pokemon modified successfully",
        "pokemon": updated,
    }))
}

fn delete_pokemon(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let slot = box_slot(doc, args, "box", "slot")?;
    doc.clear_slot(slot)?;
    Ok(ok("Pokemon deleted successfully"))
}

fn move_pokemon(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let from = box_slot(doc, args, "fromBox", "fromSlot")?;
    let to = box_slot(doc, args, "toBox", "toSlot")?;
    if doc.read_slot(from)?.is_none() {
        return Err(RpcError::invalid_value("No Pokemon in source slot"));
    }
    doc.swap_slots(from, to)?;
    Ok(ok("Pokemon moved successfully"))
}

fn get_party(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let count = doc.layout().party_count;
    let mut party = Vec::with_capacity(count);
    for slot in 0..count {
        if let Some(entity) = doc.read_slot(SlotRef::Party(slot))? {
            party.push(json!({ "slot": slot, "pokemon": entity }));
        }
    }
    Ok(json!({ "party": party, "count": count }))
}

fn get_party_slot(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let slot = party_slot(doc, args)?;
    if slot >= doc.layout().party_count {
        return Ok(empty());
    }
    Ok(doc
        .read_slot(SlotRef::Party(slot))?
        .map(Value::Object)
        .unwrap_or_else(empty))
}

fn set_party_slot(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let slot = party_slot(doc, args)?;
    let bytes = decode_base64(args.str("data")?, "Pokemon data")?;
    doc.import_slot(SlotRef::Party(slot), &bytes)?;
    Ok(ok("Party slot updated successfully"))
}

fn delete_party_slot(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let slot = party_slot(doc, args)?;
    if slot >= doc.layout().party_count {
        return Err(RpcError::invalid_value("Slot is already empty"));
    }
    doc.clear_slot(SlotRef::Party(slot))?;
    Ok(ok("Pokemon removed from party"))
}

/// 缎带类 Action 的公共前置：功能支持、槽位合法且非空
fn ribbon_target(doc: &dyn Document, args: &Arguments) -> Result<(SlotRef, Value), RpcError> {
    require(doc, Capability::Ribbons)?;
    let slot = box_slot(doc, args, "box", "slot")?;
    let entity = doc
        .read_slot(slot)?
        .ok_or_else(|| RpcError::invalid_value("No Pokemon in this slot"))?;
    Ok((slot, species_of(&entity)))
}

fn get_ribbons(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let (slot, species) = ribbon_target(doc, args)?;
    let ribbons = doc.ribbons(slot)?;
    let count = ribbons.values().filter(|has| **has).count();
    let list: Vec<Value> = ribbons
        .into_iter()
        .map(|(name, has)| json!({ "name": name, "hasRibbon": has }))
        .collect();
    Ok(json!({
        "success": true,
        "box": args.int("box")?,
        "slot": args.int("slot")?,
        "species": species,
        "ribbonCount": count,
        "ribbons": list,
    }))
}

fn set_ribbon(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let (slot, _) = ribbon_target(doc, args)?;
    let name = args.str("ribbonName")?;
    let value = args.bool("value")?;
    doc.set_ribbon(slot, name, value)?;
    let verb = if value { "added to" } else { "removed from" };
    Ok(json!({
        "success": true,
        "message": format!("Ribbon '{}' {} Pokemon", name, verb),
        "box": args.int("box")?,
        "slot": args.int("slot")?,
        "ribbonName": name,
        "value": value,
    }))
}

fn get_ribbon_count(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let (slot, species) = ribbon_target(doc, args)?;
    let count = doc.ribbons(slot)?.values().filter(|has| **has).count();
    Ok(json!({
        "success": true,
        "box": args.int("box")?,
        "slot": args.int("slot")?,
        "species": species,
        "ribbonCount": count,
    }))
}
