//! Save：加载、导出、概要与会话管理

use serde_json::{json, Value};

use super::{decode_base64, encode_base64};
use crate::core::error::RpcError;
use crate::engine::{Document, DocumentEngine};
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments, ParamSpec, ParamType};

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::Save;
    use ParamType::*;

    vec![
        ActionDescriptor::new("loadSave", Save, "Load a save file from base64-encoded data and open a new session.")
            .param(
                ParamSpec::required("data", String)
                    .with_format("base64")
                    .with_description("Base64-encoded save file bytes"),
            )
            .returns("sessionId", String, "Identifier to pass with every subsequent request")
            .returns("saveType", String, "Engine-specific save type")
            .returns("generation", Integer, "Game generation")
            .returns("features", Array, "Optional capabilities of this save file")
            .creates_session(load_save),
        ActionDescriptor::new("saveSave", Save, "Export the current save file as base64-encoded data.")
            .returns("data", String, "Base64-encoded save file bytes")
            .document(save_save),
        ActionDescriptor::new("getSaveInfo", Save, "Get general information about the loaded save file.")
            .returns("trainerName", String, "Trainer name")
            .returns("playTime", String, "Play time as '<h>h <m>m'")
            .returns("features", Array, "Optional capabilities of this save file")
            .document(get_save_info),
        ActionDescriptor::new("listSessions", Save, "List all open session identifiers.")
            .returns("sessionIds", Array, "Open session identifiers")
            .returns("count", Integer, "Number of open sessions")
            .lists_sessions(),
        ActionDescriptor::new("unloadSession", Save, "Close a session and release its save file.")
            .returns("success", Boolean, "Always true on success")
            .destroys_session(),
    ]
}

fn features(doc: &dyn Document) -> Vec<&'static str> {
    doc.capabilities().iter().map(|c| c.as_str()).collect()
}

fn load_save(engine: &dyn DocumentEngine, args: &Arguments) -> Result<(Box<dyn Document>, Value), RpcError> {
    let bytes = decode_base64(args.str("data")?, "Base64 save data")?;
    let doc = engine.load(&bytes)?;

    let summary = doc.summary();
    let layout = doc.layout();
    let payload = json!({
        "success": true,
        "saveType": summary.save_type,
        "game": summary.game,
        "generation": summary.generation,
        "trainerName": summary.trainer_name,
        "trainerID": summary.trainer_id,
        "boxCount": layout.box_count,
        "boxSlotCount": layout.box_slot_count,
        "features": features(doc.as_ref()),
    });
    Ok((doc, payload))
}

fn save_save(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let bytes = doc.write()?;
    Ok(json!({ "success": true, "data": encode_base64(&bytes) }))
}

fn get_save_info(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let summary = doc.summary();
    let layout = doc.layout();
    let time = doc.play_time();
    Ok(json!({
        "saveType": summary.save_type,
        "game": summary.game,
        "generation": summary.generation,
        "trainerName": summary.trainer_name,
        "trainerID": summary.trainer_id,
        "secretID": summary.secret_id,
        "gender": summary.gender,
        "playTime": format!("{}h {}m", time.hours, time.minutes),
        "money": summary.money,
        "boxCount": layout.box_count,
        "boxSlotCount": layout.box_slot_count,
        "partyCount": layout.party_count,
        "features": features(doc),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SnapshotEngine;
    use crate::handlers::testing;

    #[test]
    fn test_load_save_reports_features() {
        let encoded = encode_base64(&serde_json::to_vec(&testing::snapshot()).unwrap());
        let args = testing::args("loadSave", json!({ "data": encoded }));
        let (_, payload) = load_save(&SnapshotEngine::new(), &args).unwrap();

        assert_eq!(payload["success"], json!(true));
        assert_eq!(payload["saveType"], json!("SAV5BW"));
        assert_eq!(payload["boxSlotCount"], json!(4));
        let features = payload["features"].as_array().unwrap();
        assert!(features.contains(&json!("battleBox")));
        assert!(features.contains(&json!("mail")));
        assert!(!features.contains(&json!("coins")));
    }

    #[test]
    fn test_load_save_rejects_bad_input() {
        let engine = SnapshotEngine::new();
        let args = testing::args("loadSave", json!({ "data": "%%%" }));
        assert_eq!(
            load_save(&engine, &args).err().unwrap().to_string(),
            "Invalid base64 data"
        );

        let args = testing::args("loadSave", json!({ "data": encode_base64(b"garbage") }));
        let err = load_save(&engine, &args).err().unwrap();
        assert_eq!(err.kind(), "domain");
        assert!(err.to_string().starts_with("Unable to load save file"));
    }

    #[test]
    fn test_save_info_and_export() {
        let mut doc = testing::document();
        let info = get_save_info(doc.as_mut(), &Arguments::default()).unwrap();
        assert_eq!(info["playTime"], json!("40h 2m"));
        assert_eq!(info["partyCount"], json!(1));

        let exported = save_save(doc.as_mut(), &Arguments::default()).unwrap();
        assert!(!exported["data"].as_str().unwrap().is_empty());
    }
}
