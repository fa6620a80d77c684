//! Knowledge：游戏静态名称查询（无需会话）

use serde_json::{json, Value};

use crate::core::error::RpcError;
use crate::engine::{GameData, NameTable};
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments, ParamSpec, ParamType};

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::Knowledge;
    use ParamType::*;

    vec![
        ActionDescriptor::new("getSpeciesName", Knowledge, "Get the name of a Pokemon species by ID.")
            .param(ParamSpec::required("species", Integer))
            .returns("name", String, "Species name")
            .knowledge(species_name),
        ActionDescriptor::new("getMoveName", Knowledge, "Get the name of a move by ID.")
            .param(ParamSpec::required("move", Integer))
            .returns("name", String, "Move name")
            .knowledge(move_name),
        ActionDescriptor::new("getAbilityName", Knowledge, "Get the name of an ability by ID.")
            .param(ParamSpec::required("ability", Integer))
            .returns("name", String, "Ability name")
            .knowledge(ability_name),
        ActionDescriptor::new("getItemName", Knowledge, "Get the name of an item by ID.")
            .param(ParamSpec::required("item", Integer))
            .returns("name", String, "Item name")
            .knowledge(item_name),
        ActionDescriptor::new("getNatureName", Knowledge, "Get the name of a nature by ID.")
            .param(ParamSpec::required("nature", Integer))
            .returns("name", String, "Nature name")
            .knowledge(nature_name),
        ActionDescriptor::new("getTypeName", Knowledge, "Get the name of a type by ID.")
            .param(ParamSpec::required("type", Integer))
            .returns("name", String, "Type name")
            .knowledge(type_name),
        ActionDescriptor::new("getAllSpecies", Knowledge, "Get all Pokemon species with their IDs and names.")
            .returns("species", Array, "Entries of id and name")
            .returns("count", Integer, "Number of entries")
            .knowledge(all_species),
        ActionDescriptor::new("getAllMoves", Knowledge, "Get all moves with their IDs and names.")
            .returns("moves", Array, "Entries of id and name")
            .knowledge(all_moves),
        ActionDescriptor::new("getAllAbilities", Knowledge, "Get all abilities with their IDs and names.")
            .returns("abilities", Array, "Entries of id and name")
            .knowledge(all_abilities),
        ActionDescriptor::new("getAllItems", Knowledge, "Get all items with their IDs and names.")
            .returns("items", Array, "Entries of id and name")
            .knowledge(all_items),
        ActionDescriptor::new("getAllNatures", Knowledge, "Get all natures with their IDs and names.")
            .returns("natures", Array, "Entries of id and name")
            .knowledge(all_natures),
        ActionDescriptor::new("getAllTypes", Knowledge, "Get all types with their IDs and names.")
            .returns("types", Array, "Entries of id and name")
            .knowledge(all_types),
    ]
}

/// 单条查询：越界报 `Invalid <x> ID`，表内空位报 `No name found for <x> ID`
fn lookup(data: &dyn GameData, table: NameTable, args: &Arguments, key: &str) -> Result<Value, RpcError> {
    let id = args.int(key)?;
    let label = table.label();
    let invalid = || RpcError::out_of_range(format!("Invalid {} ID: {}", label, id));

    let id = u32::try_from(id).map_err(|_| invalid())?;
    if let Some(name) = data.name(table, id) {
        return Ok(json!({ "id": id, "name": name }));
    }
    let last = data.names(table).last().map(|(id, _)| *id);
    match last {
        Some(last) if id <= last => Err(RpcError::invalid_value(format!(
            "No name found for {} ID: {}",
            label, id
        ))),
        _ => Err(invalid()),
    }
}

fn listing(data: &dyn GameData, table: NameTable, key: &str) -> Result<Value, RpcError> {
    let entries: Vec<Value> = data
        .names(table)
        .into_iter()
        .map(|(id, name)| json!({ "id": id, "name": name }))
        .collect();
    Ok(json!({ "count": entries.len(), key: entries }))
}

fn species_name(data: &dyn GameData, args: &Arguments) -> Result<Value, RpcError> {
    lookup(data, NameTable::Species, args, "species")
}

fn move_name(data: &dyn GameData, args: &Arguments) -> Result<Value, RpcError> {
    lookup(data, NameTable::Moves, args, "move")
}

fn ability_name(data: &dyn GameData, args: &Arguments) -> Result<Value, RpcError> {
    lookup(data, NameTable::Abilities, args, "ability")
}

fn item_name(data: &dyn GameData, args: &Arguments) -> Result<Value, RpcError> {
    lookup(data, NameTable::Items, args, "item")
}

fn nature_name(data: &dyn GameData, args: &Arguments) -> Result<Value, RpcError> {
    lookup(data, NameTable::Natures, args, "nature")
}

fn type_name(data: &dyn GameData, args: &Arguments) -> Result<Value, RpcError> {
    lookup(data, NameTable::Types, args, "type")
}

fn all_species(data: &dyn GameData, _args: &Arguments) -> Result<Value, RpcError> {
    listing(data, NameTable::Species, "species")
}

fn all_moves(data: &dyn GameData, _args: &Arguments) -> Result<Value, RpcError> {
    listing(data, NameTable::Moves, "moves")
}

fn all_abilities(data: &dyn GameData, _args: &Arguments) -> Result<Value, RpcError> {
    listing(data, NameTable::Abilities, "abilities")
}

fn all_items(data: &dyn GameData, _args: &Arguments) -> Result<Value, RpcError> {
    listing(data, NameTable::Items, "items")
}

fn all_natures(data: &dyn GameData, _args: &Arguments) -> Result<Value, RpcError> {
    listing(data, NameTable::Natures, "natures")
}

fn all_types(data: &dyn GameData, _args: &Arguments) -> Result<Value, RpcError> {
    listing(data, NameTable::Types, "types")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tables::StaticGameData;
    use crate::handlers::testing;

    #[test]
    fn test_single_lookup() {
        let data = StaticGameData;
        let pikachu = species_name(&data, &testing::args("getSpeciesName", json!({ "species": 25 }))).unwrap();
        assert_eq!(pikachu, json!({ "id": 25, "name": "Pikachu" }));

        let nature = nature_name(&data, &testing::args("getNatureName", json!({ "nature": "3" }))).unwrap();
        assert_eq!(nature["name"], json!("Adamant"));
    }

    #[test]
    fn test_lookup_errors() {
        let data = StaticGameData;
        let err = species_name(&data, &testing::args("getSpeciesName", json!({ "species": 9999 }))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid species ID: 9999");

        let err = move_name(&data, &testing::args("getMoveName", json!({ "move": -4 }))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid move ID: -4");

        let err = species_name(&data, &testing::args("getSpeciesName", json!({ "species": 0 }))).unwrap_err();
        assert_eq!(err.to_string(), "No name found for species ID: 0");
    }

    #[test]
    fn test_listing() {
        let data = StaticGameData;
        let types = all_types(&data, &Arguments::default()).unwrap();
        assert_eq!(types["count"], json!(18));
        assert_eq!(types["types"][0], json!({ "id": 0, "name": "Normal" }));

        let species = all_species(&data, &Arguments::default()).unwrap();
        assert_eq!(species["count"], json!(151));
        assert_eq!(species["species"][0]["id"], json!(1));
    }
}
