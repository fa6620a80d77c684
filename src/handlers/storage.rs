//! Storage：盒子名称、壁纸与 Battle Box

use serde_json::{json, Value};

use super::{box_index, decode_base64, narrow, require, species_of};
use crate::core::error::RpcError;
use crate::engine::{Capability, Document, SlotRef};
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments, ParamSpec, ParamType};

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::Storage;
    use ParamType::*;

    vec![
        ActionDescriptor::new("getBoxNames", Storage, "Get all box names.")
            .returns("boxNames", Array, "Box names in index order")
            .document(get_box_names),
        ActionDescriptor::new("getBoxWallpapers", Storage, "Get box wallpaper settings for all boxes.")
            .returns("wallpapers", Array, "Entries of box and wallpaper")
            .document(get_box_wallpapers),
        ActionDescriptor::new("setBoxWallpaper", Storage, "Set box wallpaper for a specific box.")
            .param(ParamSpec::required("box", Integer))
            .param(ParamSpec::required("wallpaper", Integer))
            .document(set_box_wallpaper),
        ActionDescriptor::new("getBattleBox", Storage, "Get Battle Box Pokemon (generation-specific).")
            .returns("battleBoxCount", Integer, "Number of Battle Box slots")
            .returns("pokemon", Array, "Entries per slot")
            .document(get_battle_box),
        ActionDescriptor::new("setBattleBoxSlot", Storage, "Set a Pokemon in a Battle Box slot (generation-specific).")
            .param(ParamSpec::required("slot", Integer))
            .param(
                ParamSpec::required("data", String)
                    .with_format("base64")
                    .with_description("Base64-encoded Pokemon data"),
            )
            .document(set_battle_box_slot),
    ]
}

fn get_box_names(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let names: Vec<String> = (0..doc.layout().box_count).map(|i| doc.box_name(i)).collect();
    Ok(json!({ "boxNames": names }))
}

fn get_box_wallpapers(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let wallpapers: Vec<Value> = (0..doc.layout().box_count)
        .map(|i| json!({ "box": i, "wallpaper": doc.box_wallpaper(i) }))
        .collect();
    Ok(json!({ "supported": true, "wallpapers": wallpapers }))
}

fn set_box_wallpaper(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let index = box_index(doc, args, "box")?;
    let wallpaper: u32 = narrow(args.int("wallpaper")?, || {
        "Wallpaper must be a non-negative integer".to_string()
    })?;
    doc.set_box_wallpaper(index, wallpaper)?;
    Ok(json!({
        "success": true,
        "message": format!("Box {} wallpaper set to {}", index, wallpaper),
        "box": index,
        "wallpaper": wallpaper,
    }))
}

fn get_battle_box(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::BattleBox)?;
    let count = doc.layout().battle_box_slots;
    let mut pokemon = Vec::with_capacity(count);
    for slot in 0..count {
        let entry = match doc.read_slot(SlotRef::BattleBox(slot))? {
            Some(entity) => json!({ "slot": slot, "pokemon": entity }),
            None => json!({ "slot": slot, "empty": true }),
        };
        pokemon.push(entry);
    }
    Ok(json!({
        "battleBoxCount": count,
        "pokemon": pokemon,
        "generation": doc.summary().generation,
    }))
}

fn set_battle_box_slot(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::BattleBox)?;
    let count = doc.layout().battle_box_slots;
    let slot = args.int("slot")?;
    if slot < 0 || slot as u64 >= count as u64 {
        return Err(RpcError::out_of_range(format!(
            "Invalid slot. Must be between 0 and {}",
            count.saturating_sub(1)
        )));
    }
    let bytes = decode_base64(args.str("data")?, "Base64 Pokemon data")?;
    let entity = doc.import_slot(SlotRef::BattleBox(slot as usize), &bytes)?;
    Ok(json!({
        "success": true,
        "message": format!("Battle Box slot {} updated successfully", slot),
        "slot": slot,
        "species": species_of(&entity),
    }))
}
