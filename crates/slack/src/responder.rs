use serde_json::Value;
use tracing::warn;

use crate::blocks::MessageTemplate;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Value produced by a bot handler.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Text(String),
    Message(MessageTemplate),
    /// Already in the platform's response shape.
    Json(Value),
}

impl From<&str> for Reply {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Reply {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<MessageTemplate> for Reply {
    fn from(value: MessageTemplate) -> Self {
        Self::Message(value)
    }
}

/// Transport-neutral HTTP response assembled by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: String,
}

impl PlatformResponse {
    pub fn text(body: impl Into<String>) -> Self {
        Self { status: 200, content_type: Some(TEXT_PLAIN), body: body.into() }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self { status: 200, content_type: Some(APPLICATION_JSON), body: body.into() }
    }

    pub fn empty() -> Self {
        Self { status: 200, content_type: None, body: String::new() }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

pub trait Responder: Send + Sync {
    fn respond(&self, reply: Reply) -> PlatformResponse;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SlackResponder;

impl Responder for SlackResponder {
    fn respond(&self, reply: Reply) -> PlatformResponse {
        match reply {
            Reply::Text(text) => PlatformResponse::text(text),
            Reply::Message(message) => match serde_json::to_string(&message) {
                Ok(body) => PlatformResponse::json(body),
                Err(error) => {
                    warn!(
                        event_name = "egress.slack.reply_serialization_failed",
                        error = %error,
                        "falling back to plain-text reply"
                    );
                    PlatformResponse::text(message.fallback_text)
                }
            },
            Reply::Json(value) => PlatformResponse::json(value.to_string()),
        }
    }
}
