//! Pokedex

use serde_json::{json, Value};

use super::narrow;
use crate::core::error::RpcError;
use crate::engine::{DexFlag, Document};
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments, ParamSpec, ParamType};

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::Pokedex;
    use ParamType::*;

    let flag_params = |descriptor: ActionDescriptor| {
        descriptor
            .param(ParamSpec::required("species", Integer).with_description("National dex number"))
            .param(ParamSpec::optional("value", Boolean).with_default(true))
            .param(ParamSpec::optional("form", Integer).with_default(0))
    };

    vec![
        ActionDescriptor::new("getPokedex", Pokedex, "Get Pokedex data for all species with their seen/caught status.")
            .returns("pokedex", Array, "Entries of species, caught and seen")
            .document(get_pokedex),
        flag_params(ActionDescriptor::new("setPokedexCaught", Pokedex, "Mark a species as caught in the Pokedex."))
            .document(set_pokedex_caught),
        flag_params(ActionDescriptor::new("setPokedexSeen", Pokedex, "Mark a species as seen in the Pokedex."))
            .document(set_pokedex_seen),
    ]
}

fn get_pokedex(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let entries: Vec<Value> = doc
        .pokedex()
        .into_iter()
        .map(|e| json!({ "species": e.species, "caught": e.caught, "seen": e.seen }))
        .collect();
    Ok(json!({ "pokedex": entries }))
}

fn set_flag(doc: &mut dyn Document, args: &Arguments, flag: DexFlag) -> Result<Value, RpcError> {
    let max = doc.max_species();
    let species = args.int("species")?;
    if species <= 0 || species > max as i64 {
        return Err(RpcError::out_of_range(format!(
            "Invalid species ID. Must be between 1 and {}",
            max
        )));
    }
    let form: u8 = narrow(args.int("form")?, || "Form must be between 0 and 255".to_string())?;
    let value = args.bool("value")?;

    doc.set_dex_flag(species as u16, form, flag, value)?;
    let status = match flag {
        DexFlag::Seen => "seen",
        DexFlag::Caught => "caught",
    };
    Ok(json!({
        "success": true,
        "message": format!("Species {} {} status set to {}", species, status, value),
        "species": species,
        "form": form,
        "value": value,
    }))
}

fn set_pokedex_caught(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    set_flag(doc, args, DexFlag::Caught)
}

fn set_pokedex_seen(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    set_flag(doc, args, DexFlag::Seen)
}
