//! Communication：邮件

use serde_json::{json, Value};

use super::require;
use crate::core::error::RpcError;
use crate::engine::{Capability, Document, Entity};
use crate::registry::{ActionCategory, ActionDescriptor, ActionEntry, Arguments, ParamSpec, ParamType};

pub fn actions() -> Vec<ActionEntry> {
    use ActionCategory::Communication;
    use ParamType::*;

    vec![
        ActionDescriptor::new("getMailbox", Communication, "Get all mail messages.")
            .returns("mailCount", Integer, "Mailbox capacity")
            .returns("messages", Array, "Entries of index, isEmpty, mailType, authorName and message")
            .document(get_mailbox),
        ActionDescriptor::new("getMailMessage", Communication, "Get a specific mail message.")
            .param(ParamSpec::required("index", Integer))
            .document(get_mail_message),
        ActionDescriptor::new("deleteMail", Communication, "Delete a mail message.")
            .param(ParamSpec::required("index", Integer))
            .document(delete_mail),
    ]
}

fn mail_index(args: &Arguments, count: usize) -> Result<usize, RpcError> {
    let index = args.int("index")?;
    if index < 0 || index as u64 >= count as u64 {
        return Err(RpcError::out_of_range(format!(
            "Invalid mail index. Must be between 0 and {}",
            count as i64 - 1
        )));
    }
    Ok(index as usize)
}

fn render(index: usize, mail: Option<&Entity>) -> Value {
    let text = |key: &str| {
        mail.and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    json!({
        "index": index,
        "isEmpty": mail.is_none(),
        "mailType": mail.and_then(|m| m.get("type")).and_then(Value::as_u64).unwrap_or(0),
        "authorName": text("author"),
        "message": text("text"),
    })
}

fn get_mailbox(doc: &mut dyn Document, _args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::Mail)?;
    let mailbox = doc.mailbox()?;
    let messages: Vec<Value> = mailbox
        .iter()
        .enumerate()
        .map(|(index, mail)| render(index, mail.as_ref()))
        .collect();
    Ok(json!({ "success": true, "mailCount": mailbox.len(), "messages": messages }))
}

fn get_mail_message(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::Mail)?;
    let mailbox = doc.mailbox()?;
    let index = mail_index(args, mailbox.len())?;
    let mut body = render(index, mailbox[index].as_ref());
    body["success"] = json!(true);
    Ok(body)
}

fn delete_mail(doc: &mut dyn Document, args: &Arguments) -> Result<Value, RpcError> {
    require(doc, Capability::Mail)?;
    let count = doc.mailbox()?.len();
    let index = mail_index(args, count)?;
    doc.delete_mail(index)?;
    Ok(json!({
        "success": true,
        "message": format!("Mail message {} deleted successfully", index),
        "index": index,
    }))
}
