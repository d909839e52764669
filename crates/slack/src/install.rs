//! "Add to Slack" OAuth landing.
//!
//! Exchanges the authorization code for an access grant and redirects the
//! installer to the configured home page with a summary of the result.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{Map, Value};
use slashgate_core::{config::InstallCredentials, errors::ApplicationError};
use thiserror::Error;
use tracing::{error, info, warn};

pub const REDIRECT_STATUS: u16 = 302;
pub const SLACK_DATA_HEADER: &str = "X-slack-data";
pub const VERSION_HEADER: &str = "X-Version";
pub const EMPTY_SUMMARY: &str = "{}";

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("authorization code missing from landing request")]
    MissingCode,
    #[error("slack app install credentials are not configured")]
    NotConfigured,
    #[error("oauth token exchange request failed: {0}")]
    Upstream(String),
    #[error("oauth token endpoint returned {status}")]
    UpstreamStatus { status: u16, body: String },
}

impl From<InstallError> for ApplicationError {
    fn from(value: InstallError) -> Self {
        match value {
            InstallError::MissingCode => Self::InvalidRequest(value.to_string()),
            InstallError::NotConfigured => Self::Configuration(value.to_string()),
            InstallError::Upstream(_) | InstallError::UpstreamStatus { .. } => {
                Self::Upstream(value.to_string())
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TokenExchangeRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub code: &'a str,
    pub redirect_uri: &'a str,
}

impl TokenExchangeRequest<'_> {
    pub fn form_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("client_id", self.client_id),
            ("client_secret", self.client_secret),
            ("code", self.code),
            ("redirect_uri", self.redirect_uri),
        ]
    }
}

/// Performs the single outbound token exchange call and returns the raw body.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(
        &self,
        token_url: &str,
        request: &TokenExchangeRequest<'_>,
    ) -> Result<String, InstallError>;
}

#[derive(Clone, Debug, Default)]
pub struct HttpTokenExchanger {
    client: Client,
}

impl HttpTokenExchanger {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(
        &self,
        token_url: &str,
        request: &TokenExchangeRequest<'_>,
    ) -> Result<String, InstallError> {
        let response = self
            .client
            .post(token_url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&request.form_fields())
            .send()
            .await
            .map_err(|error| {
                error!(error = %error, "slack token exchange request failed");
                InstallError::Upstream(error.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            error!(error = %error, "could not read slack token exchange response");
            InstallError::Upstream(error.to_string())
        })?;

        if !status.is_success() {
            return Err(InstallError::UpstreamStatus { status: status.as_u16(), body });
        }
        Ok(body)
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("exchange body is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
}

pub fn decode_exchange_body(body: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(body).map_err(DecodeError::Json)
}

/// The part of a successful grant that is safe to hand to the home page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InstallSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming_webhook: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SummaryBody {
    Granted(InstallSummary),
    /// Well-formed JSON without a grant, passed through unchanged.
    Raw(String),
    /// Undecodable response.
    Empty,
}

impl SummaryBody {
    pub fn to_json(&self) -> String {
        match self {
            Self::Granted(summary) => {
                serde_json::to_string(summary).unwrap_or_else(|_| EMPTY_SUMMARY.to_owned())
            }
            Self::Raw(body) => body.clone(),
            Self::Empty => EMPTY_SUMMARY.to_owned(),
        }
    }
}

pub fn summarize_exchange(body: &str) -> SummaryBody {
    let mut parsed: Map<String, Value> = match decode_exchange_body(body) {
        Ok(Value::Object(parsed)) if parsed.contains_key("access_token") => parsed,
        Ok(_) => return SummaryBody::Raw(body.to_owned()),
        Err(error) => {
            warn!(
                event_name = "install.slack.decode_failed",
                error = %error,
                "treating token exchange response as an empty object"
            );
            return SummaryBody::Empty;
        }
    };

    SummaryBody::Granted(InstallSummary {
        incoming_webhook: parsed.remove("incoming_webhook"),
        team_name: parsed.remove("team_name"),
        team_id: parsed.remove("team_id"),
        user_id: parsed.remove("user_id"),
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallRedirect {
    pub location: String,
    pub slack_data: String,
}

impl InstallRedirect {
    pub fn new(home_page_url: &str, summary: &SummaryBody, raw_body: &str) -> Self {
        Self {
            location: format!(
                "{home_page_url}?encodedBody={}",
                urlencoding::encode(&summary.to_json())
            ),
            slack_data: urlencoding::encode(raw_body).into_owned(),
        }
    }

    pub fn headers(&self) -> [(&'static str, &str); 4] {
        [
            ("Location", self.location.as_str()),
            (VERSION_HEADER, "302"),
            ("Content-Type", "text/plain"),
            (SLACK_DATA_HEADER, self.slack_data.as_str()),
        ]
    }
}

#[derive(Clone)]
pub struct InstallFlow {
    exchanger: Arc<dyn TokenExchanger>,
}

impl Default for InstallFlow {
    fn default() -> Self {
        Self { exchanger: Arc::new(HttpTokenExchanger::default()) }
    }
}

impl InstallFlow {
    pub fn new(exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self { exchanger }
    }

    pub async fn handle_oauth_landing(
        &self,
        code: Option<&str>,
        credentials: Option<InstallCredentials<'_>>,
    ) -> Result<InstallRedirect, InstallError> {
        let credentials = credentials.ok_or(InstallError::NotConfigured)?;
        let code = code.filter(|code| !code.is_empty()).ok_or(InstallError::MissingCode)?;

        let request = TokenExchangeRequest {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret.expose_secret(),
            code,
            redirect_uri: credentials.redirect_url,
        };
        let body = self.exchanger.exchange(credentials.oauth_access_url, &request).await?;

        let summary = summarize_exchange(&body);
        info!(
            event_name = "install.slack.exchange_completed",
            granted = matches!(summary, SummaryBody::Granted(_)),
            "slack token exchange completed"
        );

        Ok(InstallRedirect::new(credentials.home_page_url, &summary, &body))
    }
}
