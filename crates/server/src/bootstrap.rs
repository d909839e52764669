use std::{sync::Arc, time::Duration};

use slashgate_core::config::{AppConfig, ConfigError};
use slashgate_slack::{BotHandler, HttpTokenExchanger, InstallFlow, SlackGateway};
use thiserror::Error;
use tracing::info;

use crate::routes::AppState;

const TOKEN_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Application {
    pub config: Arc<AppConfig>,
    pub gateway: SlackGateway,
    pub install: InstallFlow,
}

impl Application {
    pub fn state(&self) -> AppState {
        AppState {
            config: Arc::clone(&self.config),
            gateway: self.gateway.clone(),
            install: self.install.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub fn bootstrap_with_config(
    config: AppConfig,
    bot: Arc<dyn BotHandler>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let client = reqwest::Client::builder()
        .timeout(TOKEN_EXCHANGE_TIMEOUT)
        .build()
        .map_err(BootstrapError::HttpClient)?;

    info!(
        event_name = "system.bootstrap.install_flow",
        correlation_id = "bootstrap",
        install_configured = config.slack.install_configured(),
        "slack install flow initialized"
    );

    Ok(Application {
        config: Arc::new(config),
        gateway: SlackGateway::new(bot),
        install: InstallFlow::new(Arc::new(HttpTokenExchanger::new(client))),
    })
}
