//! World：秘密基地、Entralink、Festival Plaza、Poke Pelago、Poke Jobs
//!
//! 设施数据由引擎按原样给出，这里只做能力检查与外层包装。

use serde_json::{json, Value};

use super::require;
use crate::core::error::RpcError;
use crate::engine::{Capability, Document};
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments};

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::World;

    vec![
        ActionDescriptor::new("getSecretBase", World, "Get Secret Base data (Gen 3/4/6).").document(get_secret_base),
        ActionDescriptor::new("getEntralinkData", World, "Get Entralink data (Gen 5).").document(get_entralink_data),
        ActionDescriptor::new("getFestivalPlaza", World, "Get Festival Plaza data (Gen 7).").document(get_festival_plaza),
        ActionDescriptor::new("getPokePelago", World, "Get Poke Pelago data (Gen 7).").document(get_poke_pelago),
        ActionDescriptor::new("getPokeJobs", World, "Get Poke Jobs data (Gen 8).").document(get_poke_jobs),
    ]
}

fn facility(doc: &dyn Document, capability: Capability) -> Result<Value, RpcError> {
    require(doc, capability)?;
    let data = doc.facility(capability)?;
    Ok(json!({
        "success": true,
        capability.as_str(): data,
        "generation": doc.summary().generation,
    }))
}

fn get_secret_base(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    facility(doc, Capability::SecretBase)
}

fn get_entralink_data(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    facility(doc, Capability::Entralink)
}

fn get_festival_plaza(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    facility(doc, Capability::FestivalPlaza)
}

fn get_poke_pelago(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    facility(doc, Capability::PokePelago)
}

fn get_poke_jobs(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    facility(doc, Capability::PokeJobs)
}
