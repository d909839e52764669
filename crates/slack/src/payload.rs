use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

/// Decoded platform payload: form fields or the JSON object of an interaction.
pub type RawPayload = Map<String, Value>;

pub const ACTION_PAYLOAD_FIELD: &str = "payload";
pub const TOKEN_FIELD: &str = "token";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    SlashCommand,
    MessageAction,
    Landing,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SlashCommand => "slash_command",
            Self::MessageAction => "message_action",
            Self::Landing => "landing",
        }
    }
}

/// The inbound request as seen by the bot handler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlackRequest {
    pub route: Route,
    pub form: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("form field `{0}` is missing")]
    MissingField(&'static str),
    #[error("message action payload is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error("message action payload is not a JSON object")]
    NotAnObject,
}

impl SlackRequest {
    pub fn slash_command(form: HashMap<String, String>) -> Self {
        Self { route: Route::SlashCommand, form, query: HashMap::new() }
    }

    pub fn message_action(form: HashMap<String, String>) -> Self {
        Self { route: Route::MessageAction, form, query: HashMap::new() }
    }

    pub fn landing(query: HashMap<String, String>) -> Self {
        Self { route: Route::Landing, form: HashMap::new(), query }
    }

    pub fn form_payload(&self) -> RawPayload {
        self.form.iter().map(|(key, value)| (key.clone(), Value::String(value.clone()))).collect()
    }

    pub fn action_payload(&self) -> Result<RawPayload, PayloadError> {
        let raw = self
            .form
            .get(ACTION_PAYLOAD_FIELD)
            .ok_or(PayloadError::MissingField(ACTION_PAYLOAD_FIELD))?;

        match serde_json::from_str::<Value>(raw).map_err(PayloadError::MalformedJson)? {
            Value::Object(map) => Ok(map),
            _ => Err(PayloadError::NotAnObject),
        }
    }
}

pub fn payload_token(payload: &RawPayload) -> Option<&str> {
    payload.get(TOKEN_FIELD).and_then(Value::as_str)
}

/// The posted token as it appears in a mismatch reply. Non-string JSON values
/// are rendered as JSON text; an absent token is empty.
pub fn posted_token_text(payload: &RawPayload) -> String {
    match payload.get(TOKEN_FIELD) {
        None => String::new(),
        Some(Value::String(token)) => token.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::{payload_token, posted_token_text, PayloadError, SlackRequest};

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
    }

    #[test]
    fn form_payload_keeps_every_field_as_string() {
        let request =
            SlackRequest::slash_command(form(&[("token", "abc"), ("text", "hello world")]));
        let payload = request.form_payload();

        assert_eq!(payload.get("text"), Some(&json!("hello world")));
        assert_eq!(payload_token(&payload), Some("abc"));
    }

    #[test]
    fn action_payload_decodes_json_field() {
        let request = SlackRequest::message_action(form(&[(
            "payload",
            r#"{"token":"abc","user":{"id":"U1"},"actions":[{"name":"go","value":"yes"}]}"#,
        )]));
        let payload = request.action_payload().expect("decoded");

        assert_eq!(payload_token(&payload), Some("abc"));
        assert_eq!(payload["user"]["id"], "U1");
    }

    #[test]
    fn action_payload_reports_missing_and_malformed_fields() {
        let missing = SlackRequest::message_action(form(&[("token", "abc")]));
        assert!(matches!(missing.action_payload(), Err(PayloadError::MissingField("payload"))));

        let malformed = SlackRequest::message_action(form(&[("payload", "{not json")]));
        assert!(matches!(malformed.action_payload(), Err(PayloadError::MalformedJson(_))));

        let scalar = SlackRequest::message_action(form(&[("payload", "42")]));
        assert!(matches!(scalar.action_payload(), Err(PayloadError::NotAnObject)));
    }

    #[test]
    fn non_string_token_is_ignored_for_verification_but_still_shown() {
        let payload = json!({ "token": 12 }).as_object().cloned().unwrap_or_default();
        assert_eq!(payload_token(&payload), None);
        assert_eq!(posted_token_text(&payload), "12");

        let quoted = json!({ "token": "abc" }).as_object().cloned().unwrap_or_default();
        assert_eq!(posted_token_text(&quoted), "abc");
        assert_eq!(posted_token_text(&Default::default()), "");
    }
}
