use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use slashgate_core::config::SlackConfig;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    blocks,
    commands::{CommandParser, NormalizedCommand, SlackCommandParser},
    payload::{payload_token, posted_token_text, RawPayload, SlackRequest},
    responder::{PlatformResponse, Reply, Responder, SlackResponder},
    verify::tokens_match,
};

pub const SSL_CHECK_BODY: &str = "OK";
pub const INVALID_ACTION_PAYLOAD: &str = "invalid message action payload";

#[derive(Debug, Error)]
pub enum BotError {
    #[error("bot handler failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait BotHandler: Send + Sync {
    async fn handle(
        &self,
        command: NormalizedCommand,
        request: &SlackRequest,
    ) -> Result<Reply, BotError>;
}

/// Receives bot failures. The returned response, if any, is sent to the platform.
pub trait ErrorLogger: Send + Sync {
    fn log(&self, error: &BotError) -> Option<PlatformResponse>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorLogger;

impl ErrorLogger for TracingErrorLogger {
    fn log(&self, error: &BotError) -> Option<PlatformResponse> {
        error!(event_name = "bot.handler.failed", error = %error, "bot handler failed");
        None
    }
}

/// Replies with the command text. Used when no bot is plugged in.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoBot;

#[async_trait]
impl BotHandler for EchoBot {
    async fn handle(
        &self,
        command: NormalizedCommand,
        _request: &SlackRequest,
    ) -> Result<Reply, BotError> {
        Ok(Reply::Message(blocks::echo_message(&command.sender, &command.text)))
    }
}

/// Verifies inbound Slack requests and dispatches them to a [`BotHandler`].
#[derive(Clone)]
pub struct SlackGateway {
    bot: Arc<dyn BotHandler>,
    parser: Arc<dyn CommandParser>,
    responder: Arc<dyn Responder>,
    error_logger: Arc<dyn ErrorLogger>,
}

impl SlackGateway {
    pub fn new(bot: Arc<dyn BotHandler>) -> Self {
        Self {
            bot,
            parser: Arc::new(SlackCommandParser),
            responder: Arc::new(SlackResponder),
            error_logger: Arc::new(TracingErrorLogger),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn CommandParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = responder;
        self
    }

    pub fn with_error_logger(mut self, error_logger: Arc<dyn ErrorLogger>) -> Self {
        self.error_logger = error_logger;
        self
    }

    pub fn ssl_check(&self) -> PlatformResponse {
        PlatformResponse::text(SSL_CHECK_BODY)
    }

    pub async fn handle_slash_command(
        &self,
        request: &SlackRequest,
        config: &SlackConfig,
    ) -> PlatformResponse {
        let payload = request.form_payload();
        self.verify_and_dispatch(payload, request, config).await
    }

    pub async fn handle_message_action(
        &self,
        request: &SlackRequest,
        config: &SlackConfig,
    ) -> PlatformResponse {
        match request.action_payload() {
            Ok(payload) => self.verify_and_dispatch(payload, request, config).await,
            Err(error) => {
                warn!(
                    event_name = "ingress.slack.invalid_payload",
                    route = request.route.as_str(),
                    error = %error,
                    "rejecting message action with undecodable payload"
                );
                PlatformResponse::text(INVALID_ACTION_PAYLOAD).with_status(400)
            }
        }
    }

    async fn verify_and_dispatch(
        &self,
        payload: RawPayload,
        request: &SlackRequest,
        config: &SlackConfig,
    ) -> PlatformResponse {
        let correlation_id = Uuid::new_v4().to_string();
        let expected = config.token.expose_secret();
        let posted = payload_token(&payload);

        if !tokens_match(posted, expected) {
            warn!(
                event_name = "ingress.slack.token_mismatch",
                correlation_id = %correlation_id,
                route = request.route.as_str(),
                "verification token did not match"
            );
            let message = format!("unmatched token {} {}", posted_token_text(&payload), expected);
            return self.responder.respond(Reply::Text(message));
        }

        let command = self.parser.parse(&payload);
        info!(
            event_name = "ingress.slack.dispatch",
            correlation_id = %correlation_id,
            route = request.route.as_str(),
            sender = %command.sender,
            "dispatching verified request to bot handler"
        );

        match self.bot.handle(command, request).await {
            Ok(reply) => self.responder.respond(reply),
            Err(error) => {
                warn!(
                    event_name = "ingress.slack.handler_failed",
                    correlation_id = %correlation_id,
                    route = request.route.as_str(),
                    "bot handler returned an error"
                );
                self.error_logger.log(&error).unwrap_or_else(PlatformResponse::empty)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use slashgate_core::config::AppConfig;

    use super::{
        BotError, BotHandler, EchoBot, ErrorLogger, SlackGateway, INVALID_ACTION_PAYLOAD,
    };
    use crate::commands::{CommandKind, NormalizedCommand};
    use crate::payload::{Route, SlackRequest};
    use crate::responder::{PlatformResponse, Reply, Responder, APPLICATION_JSON};

    #[derive(Default)]
    struct RecordingBot {
        calls: Mutex<Vec<(NormalizedCommand, SlackRequest)>>,
        fail_with: Option<String>,
    }

    impl RecordingBot {
        fn failing(message: &str) -> Self {
            Self { calls: Mutex::default(), fail_with: Some(message.to_owned()) }
        }

        fn calls(&self) -> Vec<(NormalizedCommand, SlackRequest)> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl BotHandler for RecordingBot {
        async fn handle(
            &self,
            command: NormalizedCommand,
            request: &SlackRequest,
        ) -> Result<Reply, BotError> {
            self.calls.lock().expect("lock").push((command.clone(), request.clone()));
            match &self.fail_with {
                Some(message) => Err(BotError::Failed(message.clone())),
                None => Ok(Reply::Text(format!("handled {}", command.text))),
            }
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        logged: Mutex<Vec<String>>,
        reply: Option<PlatformResponse>,
    }

    impl ErrorLogger for RecordingLogger {
        fn log(&self, error: &BotError) -> Option<PlatformResponse> {
            self.logged.lock().expect("lock").push(error.to_string());
            self.reply.clone()
        }
    }

    struct UppercaseResponder;

    impl Responder for UppercaseResponder {
        fn respond(&self, reply: Reply) -> PlatformResponse {
            match reply {
                Reply::Text(text) => PlatformResponse::text(text.to_uppercase()),
                _ => PlatformResponse::empty(),
            }
        }
    }

    fn config(token: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.slack.token = token.to_owned().into();
        config
    }

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
    }

    #[tokio::test]
    async fn mismatched_token_replies_with_both_tokens_and_skips_bot() {
        let bot = Arc::new(RecordingBot::default());
        let gateway = SlackGateway::new(bot.clone());
        let request = SlackRequest::slash_command(form(&[
            ("token", "posted-token"),
            ("user_id", "U1"),
            ("text", "hi"),
        ]));

        let response = gateway.handle_slash_command(&request, &config("expected-token").slack).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "unmatched token posted-token expected-token");
        assert!(bot.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_token_is_rendered_empty() {
        let bot = Arc::new(RecordingBot::default());
        let gateway = SlackGateway::new(bot.clone());
        let request = SlackRequest::slash_command(form(&[("user_id", "U1"), ("text", "hi")]));

        let response = gateway.handle_slash_command(&request, &config("expected").slack).await;

        assert_eq!(response.body, "unmatched token  expected");
        assert!(bot.calls().is_empty());
    }

    #[tokio::test]
    async fn matching_token_invokes_bot_once_with_command_and_request() {
        let bot = Arc::new(RecordingBot::default());
        let gateway = SlackGateway::new(bot.clone());
        let request = SlackRequest::slash_command(form(&[
            ("token", "secret"),
            ("user_id", "U1"),
            ("text", "status api"),
        ]));

        let response = gateway.handle_slash_command(&request, &config("secret").slack).await;

        assert_eq!(response, PlatformResponse::text("handled status api"));
        let calls = bot.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.kind, CommandKind::SlashCommand);
        assert_eq!(calls[0].0.sender, "U1");
        assert_eq!(calls[0].1, request);
    }

    #[tokio::test]
    async fn bot_reply_goes_through_custom_responder() {
        let gateway = SlackGateway::new(Arc::new(RecordingBot::default()))
            .with_responder(Arc::new(UppercaseResponder));
        let request = SlackRequest::slash_command(form(&[
            ("token", "secret"),
            ("user_id", "U1"),
            ("text", "ok"),
        ]));

        let response = gateway.handle_slash_command(&request, &config("secret").slack).await;
        assert_eq!(response.body, "HANDLED OK");
    }

    #[tokio::test]
    async fn bot_failure_is_logged_once_and_not_formatted() {
        let logger = Arc::new(RecordingLogger::default());
        let gateway = SlackGateway::new(Arc::new(RecordingBot::failing("db down")))
            .with_responder(Arc::new(UppercaseResponder))
            .with_error_logger(logger.clone());
        let request = SlackRequest::slash_command(form(&[
            ("token", "secret"),
            ("user_id", "U1"),
            ("text", "ok"),
        ]));

        let response = gateway.handle_slash_command(&request, &config("secret").slack).await;

        assert_eq!(response, PlatformResponse::empty());
        assert_eq!(*logger.logged.lock().expect("lock"), vec!["bot handler failed: db down"]);
    }

    #[tokio::test]
    async fn logger_reply_is_returned_on_failure() {
        let logger = Arc::new(RecordingLogger {
            logged: Mutex::default(),
            reply: Some(PlatformResponse::text("sorry, try again")),
        });
        let gateway = SlackGateway::new(Arc::new(RecordingBot::failing("boom")))
            .with_error_logger(logger);
        let request = SlackRequest::slash_command(form(&[
            ("token", "secret"),
            ("user_id", "U1"),
            ("text", "ok"),
        ]));

        let response = gateway.handle_slash_command(&request, &config("secret").slack).await;
        assert_eq!(response.body, "sorry, try again");
    }

    #[tokio::test]
    async fn message_action_verifies_token_inside_json_payload() {
        let bot = Arc::new(RecordingBot::default());
        let gateway = SlackGateway::new(bot.clone());
        let request = SlackRequest::message_action(form(&[(
            "payload",
            r#"{"token":"secret","user":{"id":"U7"},"actions":[{"name":"approve","value":"yes"}]}"#,
        )]));

        let response = gateway.handle_message_action(&request, &config("secret").slack).await;

        assert_eq!(response.body, "handled yes");
        let calls = bot.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.kind, CommandKind::MessageAction);
        assert_eq!(calls[0].1.route, Route::MessageAction);
    }

    #[tokio::test]
    async fn message_action_ignores_outer_form_token() {
        let bot = Arc::new(RecordingBot::default());
        let gateway = SlackGateway::new(bot.clone());
        let request = SlackRequest::message_action(form(&[
            ("token", "secret"),
            ("payload", r#"{"token":"forged","user":{"id":"U7"},"actions":[]}"#),
        ]));

        let response = gateway.handle_message_action(&request, &config("secret").slack).await;

        assert_eq!(response.body, "unmatched token forged secret");
        assert!(bot.calls().is_empty());
    }

    #[tokio::test]
    async fn non_string_action_token_is_echoed_in_mismatch_reply() {
        let bot = Arc::new(RecordingBot::default());
        let gateway = SlackGateway::new(bot.clone());
        let request = SlackRequest::message_action(form(&[(
            "payload",
            r#"{"token":12,"user":{"id":"U7"},"actions":[{"name":"ok","value":"go"}]}"#,
        )]));

        let response = gateway.handle_message_action(&request, &config("secret").slack).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "unmatched token 12 secret");
        assert!(bot.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_message_action_payload_is_rejected_without_dispatch() {
        let bot = Arc::new(RecordingBot::default());
        let gateway = SlackGateway::new(bot.clone());
        let request = SlackRequest::message_action(form(&[("payload", "{\"token\":")]));

        let response = gateway.handle_message_action(&request, &config("secret").slack).await;

        assert_eq!(response.status, 400);
        assert_eq!(response.body, INVALID_ACTION_PAYLOAD);
        assert!(bot.calls().is_empty());
    }

    #[tokio::test]
    async fn echo_bot_replies_with_block_message() {
        let gateway = SlackGateway::new(Arc::new(EchoBot));
        let request = SlackRequest::slash_command(form(&[
            ("token", "secret"),
            ("user_id", "U1"),
            ("text", "ping"),
        ]));

        let response = gateway.handle_slash_command(&request, &config("secret").slack).await;

        assert_eq!(response.content_type, Some(APPLICATION_JSON));
        assert!(response.body.contains("You said: ping"));
    }

    #[test]
    fn ssl_check_answers_ok() {
        let gateway = SlackGateway::new(Arc::new(EchoBot));
        assert_eq!(gateway.ssl_check(), PlatformResponse::text("OK"));
    }
}
