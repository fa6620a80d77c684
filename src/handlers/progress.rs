//! Progress：事件标志、事件常量与名人堂

use serde_json::{json, Value};

use super::{narrow, require};
use crate::core::error::RpcError;
use crate::engine::{Capability, Document};
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments, ParamSpec, ParamType};

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::Progress;
    use ParamType::*;

    vec![
        ActionDescriptor::new("getEventFlag", Progress, "Get an event flag value by index.")
            .param(ParamSpec::required("flagIndex", Integer))
            .returns("value", Boolean, "Flag state")
            .document(get_event_flag),
        ActionDescriptor::new("setEventFlag", Progress, "Set an event flag value by index.")
            .param(ParamSpec::required("flagIndex", Integer))
            .param(ParamSpec::optional("value", Boolean).with_default(true))
            .document(set_event_flag),
        ActionDescriptor::new("getEventConst", Progress, "Get an event const/work value by index.")
            .param(ParamSpec::required("constIndex", Integer))
            .returns("value", Integer, "Stored value")
            .document(get_event_const),
        ActionDescriptor::new("setEventConst", Progress, "Set an event const/work value by index.")
            .param(ParamSpec::required("constIndex", Integer))
            .param(ParamSpec::required("value", Integer).with_description("0-65535"))
            .document(set_event_const),
        ActionDescriptor::new("getHallOfFame", Progress, "Get Hall of Fame entries.")
            .returns("entries", Array, "Recorded teams")
            .document(get_hall_of_fame),
    ]
}

fn non_negative(args: &Arguments, key: &str, message: &str) -> Result<usize, RpcError> {
    let index = args.int(key)?;
    if index < 0 {
        return Err(RpcError::out_of_range(message));
    }
    Ok(index as usize)
}

fn get_event_flag(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let index = non_negative(args, "flagIndex", "Flag index must be non-negative")?;
    let value = doc.event_flag(index)?;
    Ok(json!({
        "flagIndex": index,
        "value": value,
        "generation": doc.summary().generation,
    }))
}

fn set_event_flag(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let index = non_negative(args, "flagIndex", "Flag index must be non-negative")?;
    let value = args.bool("value")?;
    doc.set_event_flag(index, value)?;
    Ok(json!({
        "success": true,
        "message": format!("Event flag {} set to {}", index, value),
        "flagIndex": index,
        "value": value,
        "generation": doc.summary().generation,
    }))
}

fn get_event_const(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let index = non_negative(args, "constIndex", "Const index must be non-negative")?;
    let value = doc.event_const(index)?;
    Ok(json!({
        "constIndex": index,
        "value": value,
        "generation": doc.summary().generation,
    }))
}

fn set_event_const(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let index = non_negative(args, "constIndex", "Const index must be non-negative")?;
    let value: u16 = narrow(args.int("value")?, || "Value must be between 0 and 65535".to_string())?;
    doc.set_event_const(index, value)?;
    Ok(json!({
        "success": true,
        "message": format!("Event const {} set to {}", index, value),
        "constIndex": index,
        "value": value,
        "generation": doc.summary().generation,
    }))
}

fn get_hall_of_fame(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::HallOfFame)?;
    let recorded = doc.hall_of_fame()?;
    let count = recorded.len();
    // 空队伍不输出，但下标保留原位置
    let entries: Vec<Value> = recorded
        .into_iter()
        .enumerate()
        .filter(|(_, team)| team.as_array().map_or(true, |members| !members.is_empty()))
        .map(|(index, team)| json!({ "index": index, "team": team }))
        .collect();
    Ok(json!({ "success": true, "entryCount": count, "entries": entries }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DocumentEngine, SnapshotEngine};
    use crate::handlers::testing;

    #[test]
    fn test_event_flags() {
        let mut doc = testing::document();
        let flag = get_event_flag(doc.as_mut(), &testing::args("getEventFlag", json!({ "flagIndex": 2 }))).unwrap();
        assert_eq!(flag["value"], json!(true));

        set_event_flag(doc.as_mut(), &testing::args("setEventFlag", json!({ "flagIndex": 0 }))).unwrap();
        let flag = get_event_flag(doc.as_mut(), &testing::args("getEventFlag", json!({ "flagIndex": 0 }))).unwrap();
        assert_eq!(flag["value"], json!(true));

        let err = get_event_flag(doc.as_mut(), &testing::args("getEventFlag", json!({ "flagIndex": -1 }))).unwrap_err();
        assert_eq!(err.to_string(), "Flag index must be non-negative");

        let err = get_event_flag(doc.as_mut(), &testing::args("getEventFlag", json!({ "flagIndex": 3 }))).unwrap_err();
        assert_eq!(err.to_string(), "Event flag index 3 out of range (0-2)");
    }

    #[test]
    fn test_event_consts() {
        let mut doc = testing::document();
        let result =
            set_event_const(doc.as_mut(), &testing::args("setEventConst", json!({ "constIndex": 1, "value": 700 }))).unwrap();
        assert_eq!(result["message"], json!("Event const 1 set to 700"));

        let value = get_event_const(doc.as_mut(), &testing::args("getEventConst", json!({ "constIndex": 1 }))).unwrap();
        assert_eq!(value["value"], json!(700));

        let err = set_event_const(doc.as_mut(), &testing::args("setEventConst", json!({ "constIndex": 1, "value": 70000 })))
            .unwrap_err();
        assert_eq!(err.to_string(), "Value must be between 0 and 65535");
    }

    #[test]
    fn test_hall_of_fame() {
        let mut doc = testing::document();
        let err = get_hall_of_fame(doc.as_mut(), &Arguments::default()).unwrap_err();
        assert_eq!(err.to_string(), "Hall of Fame not supported for this save file");

        let mut snapshot = testing::snapshot();
        snapshot["hallOfFame"] = json!([[{ "species": 497, "level": 60 }], []]);
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        let mut doc = SnapshotEngine::new().load(&bytes).unwrap();

        let hof = get_hall_of_fame(doc.as_mut(), &Arguments::default()).unwrap();
        assert_eq!(hof["entryCount"], json!(2));
        assert_eq!(hof["entries"].as_array().unwrap().len(), 1);
        assert_eq!(hof["entries"][0]["team"][0]["species"], json!(497));
    }
}
