//! Trainer：训练家资料、徽章、游戏时间、计数器、劲敌名与记录

use serde_json::{json, Value};

use super::{bounded, format_seconds, narrow, require};
use crate::core::error::RpcError;
use crate::engine::{Capability, Counter, Document, PlayTime};
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments, ParamSpec, ParamType};

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::Trainer;
    use ParamType::*;

    vec![
        ActionDescriptor::new("getTrainerInfo", Trainer, "Get trainer information.")
            .returns("trainerName", String, "Trainer name")
            .returns("trainerID", Integer, "Displayed trainer ID")
            .document(get_trainer_info),
        ActionDescriptor::new("setTrainerInfo", Trainer, "Modify trainer information.")
            .param(
                ParamSpec::required("trainer", Object)
                    .with_description("Any of trainerName, trainerID, secretID, gender, money"),
            )
            .document(set_trainer_info),
        ActionDescriptor::new("getBadges", Trainer, "Get badge data for the save file (generation-specific).")
            .returns("badges", Array, "Entries of badgeIndex and obtained")
            .document(get_badges),
        ActionDescriptor::new("setBadge", Trainer, "Set a badge status for the save file (generation-specific).")
            .param(ParamSpec::required("badgeIndex", Integer))
            .param(ParamSpec::optional("value", Boolean).with_default(true))
            .document(set_badge),
        ActionDescriptor::new("getSecondsPlayed", Trainer, "Get total seconds played from the save file.")
            .returns("totalSeconds", Integer, "Play time in seconds")
            .document(get_seconds_played),
        ActionDescriptor::new("setGameTime", Trainer, "Set game play time (hours, minutes, seconds).")
            .param(ParamSpec::required("hours", Integer))
            .param(ParamSpec::required("minutes", Integer))
            .param(ParamSpec::required("seconds", Integer))
            .document(set_game_time),
        ActionDescriptor::new("getSecondsToStart", Trainer, "Get seconds from game start to save creation.")
            .document(get_seconds_to_start),
        ActionDescriptor::new("setSecondsToStart", Trainer, "Set seconds from game start to save creation.")
            .param(ParamSpec::required("seconds", Integer))
            .document(set_seconds_to_start),
        ActionDescriptor::new("getSecondsToFame", Trainer, "Get seconds from game start to Hall of Fame entry.")
            .document(get_seconds_to_fame),
        ActionDescriptor::new("setSecondsToFame", Trainer, "Set seconds from game start to Hall of Fame entry.")
            .param(ParamSpec::required("seconds", Integer))
            .document(set_seconds_to_fame),
        ActionDescriptor::new("getCoins", Trainer, "Get Game Corner coins (generation-specific).")
            .document(get_coins),
        ActionDescriptor::new("setCoins", Trainer, "Set Game Corner coins (generation-specific).")
            .param(ParamSpec::required("coins", Integer))
            .document(set_coins),
        ActionDescriptor::new("getBattlePoints", Trainer, "Get Battle Points (generation-specific).")
            .document(get_battle_points),
        ActionDescriptor::new("setBattlePoints", Trainer, "Set Battle Points (generation-specific).")
            .param(ParamSpec::required("battlePoints", Integer))
            .document(set_battle_points),
        ActionDescriptor::new("getRivalName", Trainer, "Get rival's name (generation-specific).")
            .document(get_rival_name),
        ActionDescriptor::new("setRivalName", Trainer, "Set rival's name (generation-specific).")
            .param(ParamSpec::required("rivalName", String))
            .document(set_rival_name),
        ActionDescriptor::new("getRecords", Trainer, "Get trainer statistics and records (generation-specific).")
            .returns("records", Array, "Entries of index, value and max")
            .document(get_records),
        ActionDescriptor::new("setRecord", Trainer, "Set a specific trainer record value (generation-specific).")
            .param(ParamSpec::required("index", Integer))
            .param(ParamSpec::required("value", Integer))
            .document(set_record),
        ActionDescriptor::new("getRecordValue", Trainer, "Get a specific trainer record value (generation-specific).")
            .param(ParamSpec::required("index", Integer))
            .document(get_record_value),
    ]
}

fn generation(doc: &dyn Document) -> u8 {
    doc.summary().generation
}

fn get_trainer_info(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let mut info = doc.trainer();
    let time = doc.play_time();
    info.insert(
        "playTime".to_string(),
        json!(format!("{}h {}m", time.hours, time.minutes)),
    );
    Ok(Value::Object(info))
}

fn set_trainer_info(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let updated = doc.update_trainer(args.object("trainer")?)?;
    Ok(json!({
        "success": true,
        "message": "Trainer info updated successfully",
        "updated": updated,
    }))
}

fn get_badges(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::Badges)?;
    let badges: Vec<Value> = doc
        .badges()?
        .into_iter()
        .enumerate()
        .map(|(index, obtained)| json!({ "badgeIndex": index, "obtained": obtained }))
        .collect();
    Ok(json!({ "badges": badges, "generation": generation(doc) }))
}

fn set_badge(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::Badges)?;
    let count = doc.badges()?.len();
    let index = args.int("badgeIndex")?;
    if index < 0 || index as u64 >= count as u64 {
        return Err(RpcError::out_of_range(format!(
            "Badge index must be between 0 and {}",
            count.saturating_sub(1)
        )));
    }
    let value = args.bool("value")?;
    doc.set_badge(index as usize, value)?;
    Ok(json!({
        "success": true,
        "message": format!("Badge {} set to {}", index, value),
        "badgeIndex": index,
        "value": value,
        "generation": generation(doc),
    }))
}

fn get_seconds_played(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    let time = doc.play_time();
    Ok(json!({
        "hours": time.hours,
        "minutes": time.minutes,
        "seconds": time.seconds,
        "totalSeconds": time.total_seconds(),
    }))
}

fn set_game_time(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let (hours, minutes, seconds) = (args.int("hours")?, args.int("minutes")?, args.int("seconds")?);
    if hours < 0 || minutes < 0 || seconds < 0 {
        return Err(RpcError::out_of_range("Time values cannot be negative"));
    }
    if minutes >= 60 || seconds >= 60 {
        return Err(RpcError::out_of_range("Minutes and seconds must be less than 60"));
    }
    let time = PlayTime {
        hours: narrow(hours, || "Hours value is too large".to_string())?,
        minutes: minutes as u8,
        seconds: seconds as u8,
    };
    doc.set_play_time(time)?;
    Ok(json!({
        "success": true,
        "message": format!("Game time set to {}h {}m {}s", hours, minutes, seconds),
        "hours": time.hours,
        "minutes": time.minutes,
        "seconds": time.seconds,
        "totalSeconds": time.total_seconds(),
    }))
}

/// 计数器参数：非负且不超过 u32
fn counter_value(args: &Arguments, key: &str) -> Result<u32, RpcError> {
    narrow(args.int(key)?, || format!("{} must be between 0 and {}", key, u32::MAX))
}

fn read_counter(doc: &dyn Document, counter: Counter, key: &str) -> Result<Value, RpcError> {
    require(doc, counter.capability())?;
    let value = doc.counter(counter)?;
    let mut body = json!({ key: value, "generation": generation(doc) });
    if matches!(counter, Counter::SecondsToStart | Counter::SecondsToFame) {
        body["timeDisplay"] = json!(format_seconds(value as u64));
    }
    Ok(body)
}

fn write_counter(doc: &mut dyn Document, counter: Counter, key: &str, value: u32, label: &str) -> Result<Value, RpcError> {
    require(doc, counter.capability())?;
    doc.set_counter(counter, value)?;
    let mut body = json!({
        "success": true,
        "message": format!("{} updated successfully", label),
        key: value,
        "generation": generation(doc),
    });
    if matches!(counter, Counter::SecondsToStart | Counter::SecondsToFame) {
        body["timeDisplay"] = json!(format_seconds(value as u64));
    }
    Ok(body)
}

fn get_seconds_to_start(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    read_counter(doc, Counter::SecondsToStart, "secondsToStart")
}

fn set_seconds_to_start(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let value = counter_value(args, "seconds")?;
    write_counter(doc, Counter::SecondsToStart, "secondsToStart", value, "Seconds to start")
}

fn get_seconds_to_fame(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    read_counter(doc, Counter::SecondsToFame, "secondsToFame")
}

fn set_seconds_to_fame(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let value = counter_value(args, "seconds")?;
    write_counter(doc, Counter::SecondsToFame, "secondsToFame", value, "Seconds to fame")
}

fn get_coins(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    read_counter(doc, Counter::Coins, "coins")
}

fn set_coins(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let value = counter_value(args, "coins")?;
    write_counter(doc, Counter::Coins, "coins", value, "Coins")
}

fn get_battle_points(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    read_counter(doc, Counter::BattlePoints, "battlePoints")
}

fn set_battle_points(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let value = counter_value(args, "battlePoints")?;
    write_counter(doc, Counter::BattlePoints, "battlePoints", value, "Battle Points")
}

fn get_rival_name(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::RivalName)?;
    Ok(json!({ "rivalName": doc.rival_name()?, "generation": generation(doc) }))
}

fn set_rival_name(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    let name = args.str("rivalName")?;
    if name.trim().is_empty() {
        return Err(RpcError::invalid_value("Rival name cannot be empty"));
    }
    require(doc, Capability::RivalName)?;
    doc.set_rival_name(name)?;
    Ok(json!({
        "success": true,
        "message": "Rival name updated successfully",
        "rivalName": name,
        "generation": generation(doc),
    }))
}

fn get_records(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::TrainerRecords)?;
    let records: Vec<Value> = doc
        .records()?
        .into_iter()
        .enumerate()
        .map(|(index, r)| json!({ "index": index, "value": r.value, "max": r.max }))
        .collect();
    Ok(json!({ "recordCount": records.len(), "records": records }))
}

fn set_record(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::TrainerRecords)?;
    let records = doc.records()?;
    let index = bounded(args.int("index")?, records.len(), "Record")?;
    let value: i32 = narrow(args.int("value")?, || "Record value is out of range".to_string())?;
    let max = records[index].max;
    if value < 0 {
        return Err(RpcError::out_of_range(format!(
            "Value {} is negative for record index {}",
            value, index
        )));
    }
    if value > max {
        return Err(RpcError::out_of_range(format!(
            "Value {} exceeds maximum {} for record index {}",
            value, max, index
        )));
    }
    doc.set_record(index, value)?;
    Ok(json!({
        "success": true,
        "message": format!("Record {} set to {}", index, value),
        "index": index,
        "value": value,
        "max": max,
    }))
}

fn get_record_value(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::TrainerRecords)?;
    let records = doc.records()?;
    let index = bounded(args.int("index")?, records.len(), "Record")?;
    let record = records[index];
    Ok(json!({ "index": index, "value": record.value, "max": record.max }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing;

    #[test]
    fn test_trainer_info_round() {
        let mut doc = testing::document();
        let info = get_trainer_info(doc.as_mut(), &Arguments::default()).unwrap();
        assert_eq!(info["trainerName"], json!("HILDA"));
        assert_eq!(info["playTime"], json!("40h 2m"));

        let args = testing::args("setTrainerInfo", json!({ "trainer": { "trainerName": "ROSA", "money": 10, "hat": 1 } }));
        let result = set_trainer_info(doc.as_mut(), &args).unwrap();
        assert_eq!(result["updated"], json!(["trainerName", "money"]));

        let info = get_trainer_info(doc.as_mut(), &Arguments::default()).unwrap();
        assert_eq!(info["trainerName"], json!("ROSA"));
        assert_eq!(info["money"], json!(10));
    }

    #[test]
    fn test_badges() {
        let mut doc = testing::document();
        set_badge(doc.as_mut(), &testing::args("setBadge", json!({ "badgeIndex": 3 }))).unwrap();
        let badges = get_badges(doc.as_mut(), &Arguments::default()).unwrap();
        assert_eq!(badges["badges"][3], json!({ "badgeIndex": 3, "obtained": true }));

        let err = set_badge(doc.as_mut(), &testing::args("setBadge", json!({ "badgeIndex": 8 }))).unwrap_err();
        assert_eq!(err.to_string(), "Badge index must be between 0 and 7");
    }

    #[test]
    fn test_game_time() {
        let mut doc = testing::document();
        let err = set_game_time(doc.as_mut(), &testing::args("setGameTime", json!({ "hours": 1, "minutes": 60, "seconds": 0 })))
            .unwrap_err();
        assert_eq!(err.to_string(), "Minutes and seconds must be less than 60");

        set_game_time(doc.as_mut(), &testing::args("setGameTime", json!({ "hours": 1, "minutes": 1, "seconds": 1 }))).unwrap();
        let played = get_seconds_played(doc.as_mut(), &Arguments::default()).unwrap();
        assert_eq!(played["totalSeconds"], json!(3661));
    }

    #[test]
    fn test_counters_and_capabilities() {
        let mut doc = testing::document();
        let start = get_seconds_to_start(doc.as_mut(), &Arguments::default()).unwrap();
        assert_eq!(start["secondsToStart"], json!(3600));
        assert_eq!(start["timeDisplay"], json!("1h 0m 0s"));

        set_battle_points(doc.as_mut(), &testing::args("setBattlePoints", json!({ "battlePoints": 99 }))).unwrap();
        let bp = get_battle_points(doc.as_mut(), &Arguments::default()).unwrap();
        assert_eq!(bp["battlePoints"], json!(99));

        // 快照中没有 coins 计数器
        let err = get_coins(doc.as_mut(), &Arguments::default()).unwrap_err();
        assert_eq!(err.to_string(), "Coins not supported for this save file");

        let err = set_coins(doc.as_mut(), &testing::args("setCoins", json!({ "coins": -1 }))).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_rival_name_unsupported_and_empty() {
        let mut doc = testing::document();
        let err = set_rival_name(doc.as_mut(), &testing::args("setRivalName", json!({ "rivalName": " " }))).unwrap_err();
        assert_eq!(err.to_string(), "Rival name cannot be empty");

        let err = get_rival_name(doc.as_mut(), &Arguments::default()).unwrap_err();
        assert_eq!(err.to_string(), "Rival name not supported for this save file");
    }

    #[test]
    fn test_records() {
        let mut doc = testing::document();
        let err = set_record(doc.as_mut(), &testing::args("setRecord", json!({ "index": 1, "value": 10000 }))).unwrap_err();
        assert_eq!(err.to_string(), "Value 10000 exceeds maximum 9999 for record index 1");
        let err = set_record(doc.as_mut(), &testing::args("setRecord", json!({ "index": 1, "value": -1 }))).unwrap_err();
        assert_eq!(err.to_string(), "Value -1 is negative for record index 1");
        assert!(matches!(err, RpcError::OutOfRange(_)));

        set_record(doc.as_mut(), &testing::args("setRecord", json!({ "index": 1, "value": 12 }))).unwrap();
        let value = get_record_value(doc.as_mut(), &testing::args("getRecordValue", json!({ "index": 1 }))).unwrap();
        assert_eq!(value, json!({ "index": 1, "value": 12, "max": 9999 }));

        let err = get_record_value(doc.as_mut(), &testing::args("getRecordValue", json!({ "index": 2 }))).unwrap_err();
        assert_eq!(err.to_string(), "Record index 2 out of range (0-1)");

        let all = get_records(doc.as_mut(), &Arguments::default()).unwrap();
        assert_eq!(all["recordCount"], json!(2));
    }
}
