use serde::Serialize;
use serde_json::Value;

use crate::payload::RawPayload;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CommandKind {
    #[serde(rename = "slack-slash-command")]
    SlashCommand,
    #[serde(rename = "slack-message-action")]
    MessageAction,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Command handed to the bot handler. Its shape is owned by the parser.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedCommand {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub sender: String,
    pub text: String,
    pub postback: bool,
    #[serde(rename = "originalRequest")]
    pub original: RawPayload,
}

pub trait CommandParser: Send + Sync {
    fn parse(&self, payload: &RawPayload) -> NormalizedCommand;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SlackCommandParser;

impl CommandParser for SlackCommandParser {
    fn parse(&self, payload: &RawPayload) -> NormalizedCommand {
        if let (Some(sender), Some(text)) = (string_field(payload, "user_id"), string_field(payload, "text")) {
            return NormalizedCommand {
                kind: CommandKind::SlashCommand,
                sender: sender.to_owned(),
                text: text.to_owned(),
                postback: false,
                original: payload.clone(),
            };
        }

        let action_sender =
            payload.get("user").and_then(|user| user.get("id")).and_then(Value::as_str);
        let actions = payload.get("actions").and_then(Value::as_array);
        if let (Some(sender), Some(actions)) = (action_sender, actions) {
            return NormalizedCommand {
                kind: CommandKind::MessageAction,
                sender: sender.to_owned(),
                text: actions.first().and_then(action_text).unwrap_or_default().to_owned(),
                postback: true,
                original: payload.clone(),
            };
        }

        NormalizedCommand {
            kind: CommandKind::Unknown,
            sender: String::new(),
            text: String::new(),
            postback: false,
            original: payload.clone(),
        }
    }
}

fn string_field<'a>(payload: &'a RawPayload, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

// Buttons carry `value`, menus carry the selected option, legacy attachments only `name`.
fn action_text(action: &Value) -> Option<&str> {
    action
        .get("value")
        .and_then(Value::as_str)
        .or_else(|| {
            action
                .get("selected_options")
                .and_then(Value::as_array)
                .and_then(|options| options.first())
                .and_then(|option| option.get("value"))
                .and_then(Value::as_str)
        })
        .or_else(|| {
            action.get("selected_option").and_then(|option| option.get("value")).and_then(Value::as_str)
        })
        .or_else(|| action.get("name").and_then(Value::as_str))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CommandKind, CommandParser, SlackCommandParser};
    use crate::payload::RawPayload;

    fn payload(value: serde_json::Value) -> RawPayload {
        value.as_object().cloned().expect("object payload")
    }

    #[test]
    fn parses_slash_command_fields() {
        let raw = payload(json!({
            "token": "abc",
            "user_id": "U123",
            "text": "deploy api",
            "command": "/ops",
        }));
        let command = SlackCommandParser.parse(&raw);

        assert_eq!(command.kind, CommandKind::SlashCommand);
        assert_eq!(command.sender, "U123");
        assert_eq!(command.text, "deploy api");
        assert!(!command.postback);
        assert_eq!(command.original, raw);
    }

    #[test]
    fn empty_slash_command_text_is_still_a_command() {
        let command = SlackCommandParser.parse(&payload(json!({ "user_id": "U1", "text": "" })));
        assert_eq!(command.kind, CommandKind::SlashCommand);
        assert_eq!(command.text, "");
    }

    #[test]
    fn parses_button_action_value() {
        let command = SlackCommandParser.parse(&payload(json!({
            "user": { "id": "U9", "name": "sam" },
            "actions": [{ "name": "approve", "value": "yes" }],
        })));

        assert_eq!(command.kind, CommandKind::MessageAction);
        assert_eq!(command.sender, "U9");
        assert_eq!(command.text, "yes");
        assert!(command.postback);
    }

    #[test]
    fn falls_back_to_selected_option_then_name() {
        let menu = SlackCommandParser.parse(&payload(json!({
            "user": { "id": "U9" },
            "actions": [{ "name": "pick", "selected_options": [{ "value": "blue" }] }],
        })));
        assert_eq!(menu.text, "blue");

        let named = SlackCommandParser.parse(&payload(json!({
            "user": { "id": "U9" },
            "actions": [{ "name": "pick" }],
        })));
        assert_eq!(named.text, "pick");
    }

    #[test]
    fn unrecognized_payload_is_unknown() {
        let command = SlackCommandParser.parse(&payload(json!({ "token": "abc" })));
        assert_eq!(command.kind, CommandKind::Unknown);
        assert!(command.sender.is_empty());
    }

    #[test]
    fn serializes_with_platform_type_names() {
        let command =
            SlackCommandParser.parse(&payload(json!({ "user_id": "U1", "text": "hi" })));
        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value["type"], "slack-slash-command");
        assert_eq!(value["originalRequest"]["text"], "hi");
    }
}
