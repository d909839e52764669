use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::routes::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub install: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let install = if state.config.slack.install_configured() {
        HealthCheck {
            status: "ready",
            detail: format!("oauth landing exchanges codes at {}", state.config.slack.oauth_access_url),
        }
    } else {
        HealthCheck {
            status: "disabled",
            detail: "slack app install credentials not configured".to_string(),
        }
    };

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "slashgate-server accepting slack requests".to_string(),
        },
        install,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use slashgate_core::config::AppConfig;
    use slashgate_slack::{EchoBot, InstallFlow, SlackGateway};

    use crate::health::health;
    use crate::routes::AppState;

    fn state(config: AppConfig) -> AppState {
        AppState {
            config: Arc::new(config),
            gateway: SlackGateway::new(Arc::new(EchoBot)),
            install: InstallFlow::default(),
        }
    }

    #[tokio::test]
    async fn health_reports_install_disabled_without_credentials() {
        let (status, Json(payload)) = health(State(state(AppConfig::default()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.install.status, "disabled");
    }

    #[tokio::test]
    async fn health_reports_install_ready_when_configured() {
        let mut config = AppConfig::default();
        config.slack.client_id = Some("123.456".to_string());
        config.slack.client_secret = Some("secret".to_string().into());
        config.slack.home_page_url = Some("https://example.com".to_string());
        config.slack.redirect_url = Some("https://api.example.com/slack/landing".to_string());

        let (_, Json(payload)) = health(State(state(config))).await;

        assert_eq!(payload.install.status, "ready");
        assert!(payload.install.detail.contains("slack.com/api/oauth.access"));
    }
}
