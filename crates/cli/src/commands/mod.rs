pub mod config;
pub mod setup;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_url: Option<String>,
}

impl CommandResult {
    /// Success that also reports the slash-command request URL to paste into Slack.
    pub fn success(command: &str, message: impl Into<String>, request_url: String) -> Self {
        Self::emit(0, CommandOutcome {
            command,
            status: "ok",
            error_class: None,
            message: message.into(),
            request_url: Some(request_url),
        })
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::emit(exit_code, CommandOutcome {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
            request_url: None,
        })
    }

    fn emit(exit_code: u8, payload: CommandOutcome<'_>) -> Self {
        let output = serde_json::to_string(&payload).unwrap_or_else(|error| {
            format!(
                "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        });
        Self { exit_code, output }
    }
}
