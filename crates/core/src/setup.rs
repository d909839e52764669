//! Post-deploy setup contract.
//!
//! Decides which stage variables a deployment needs, collects them through a
//! [`SecretPrompter`] and hands them to a [`StageVariableStore`]. The prompt UI
//! and the persistence mechanism are supplied by the caller.

use thiserror::Error;

pub const SLASH_COMMAND_PATH: &str = "/slack/slash-command";
pub const MESSAGE_ACTION_PATH: &str = "/slack/message-action";
pub const LANDING_PATH: &str = "/slack/landing";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetupOptions {
    pub configure_slash_command: bool,
    pub configure_slash_app: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentDetails {
    pub api_url: String,
    pub api_id: String,
    pub stage_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupMode {
    SlashCommand,
    SlashApp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageVariable {
    SlackToken,
    SlackClientId,
    SlackClientSecret,
    SlackHomePageUrl,
    SlackRedirectUrl,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageDeployment {
    pub rest_api_id: String,
    pub stage_name: String,
    pub variables: Vec<(StageVariable, String)>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("prompt failed: {0}")]
    Prompt(String),
    #[error("no answer was given for `{0}`")]
    MissingAnswer(&'static str),
    #[error("stage variable deployment failed: {0}")]
    Store(String),
}

pub trait SecretPrompter {
    fn announce(&mut self, message: &str);

    /// Returns one answer per label, in label order.
    fn prompt(&mut self, labels: &[&'static str]) -> Result<Vec<String>, SetupError>;
}

pub trait StageVariableStore {
    fn deploy(&mut self, deployment: &StageDeployment) -> Result<(), SetupError>;
}

impl SetupOptions {
    /// Slash-command setup takes precedence when both flags are given.
    pub fn mode(&self) -> Option<SetupMode> {
        if self.configure_slash_command {
            Some(SetupMode::SlashCommand)
        } else if self.configure_slash_app {
            Some(SetupMode::SlashApp)
        } else {
            None
        }
    }
}

impl SetupMode {
    pub fn required_variables(self) -> &'static [StageVariable] {
        match self {
            Self::SlashCommand => &[StageVariable::SlackToken],
            Self::SlashApp => &[
                StageVariable::SlackClientId,
                StageVariable::SlackClientSecret,
                StageVariable::SlackToken,
                StageVariable::SlackHomePageUrl,
                StageVariable::SlackRedirectUrl,
            ],
        }
    }

    pub fn prompted_variables(self) -> Vec<StageVariable> {
        self.required_variables().iter().copied().filter(|var| var.prompt_label().is_some()).collect()
    }
}

impl StageVariable {
    pub fn name(self) -> &'static str {
        match self {
            Self::SlackToken => "slackToken",
            Self::SlackClientId => "slackClientId",
            Self::SlackClientSecret => "slackClientSecret",
            Self::SlackHomePageUrl => "slackHomePageUrl",
            Self::SlackRedirectUrl => "slackRedirectUrl",
        }
    }

    /// Key under the `[slack]` table of the config file.
    pub fn config_key(self) -> &'static str {
        match self {
            Self::SlackToken => "token",
            Self::SlackClientId => "client_id",
            Self::SlackClientSecret => "client_secret",
            Self::SlackHomePageUrl => "home_page_url",
            Self::SlackRedirectUrl => "redirect_url",
        }
    }

    /// `None` for variables derived from the deployment rather than asked for.
    pub fn prompt_label(self) -> Option<&'static str> {
        match self {
            Self::SlackToken => Some("Slack token"),
            Self::SlackClientId => Some("Slack Client ID"),
            Self::SlackClientSecret => Some("Slack Client Secret"),
            Self::SlackHomePageUrl => Some("Home page URL"),
            Self::SlackRedirectUrl => None,
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, Self::SlackToken | Self::SlackClientSecret)
    }
}

impl DeploymentDetails {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url.trim_end_matches('/'))
    }

    pub fn slash_command_url(&self) -> String {
        self.endpoint(SLASH_COMMAND_PATH)
    }

    pub fn message_action_url(&self) -> String {
        self.endpoint(MESSAGE_ACTION_PATH)
    }

    pub fn landing_url(&self) -> String {
        self.endpoint(LANDING_PATH)
    }
}

pub fn setup_banner(mode: SetupMode, details: &DeploymentDetails) -> Vec<String> {
    match mode {
        SetupMode::SlashCommand => vec![
            "Slack slash command setup".to_string(),
            "Following info is required for the setup, for more info check the documentation."
                .to_string(),
            format!(
                "Your Slack slash command Request URL (POST only) is {}",
                details.slash_command_url()
            ),
            "If you are building full-scale Slack app instead of just a slash command for your team, restart with --configure-slack-slash-app".to_string(),
        ],
        SetupMode::SlashApp => vec![
            "Slack App slash command setup".to_string(),
            "Following info is required for the setup, for more info check the documentation."
                .to_string(),
            format!("Your Slack redirect URL is {}", details.landing_url()),
            format!(
                "Your Slack slash command Request URL (POST only) is {}",
                details.slash_command_url()
            ),
            format!("If you are using buttons, your Action URL is {}", details.message_action_url()),
            "If you are building just a slash command integration for your team and you don't need full-scale Slack app restart with --configure-slack-slash-command".to_string(),
        ],
    }
}

/// Runs the post-deploy hook and returns the slash-command request URL.
pub fn run_post_deploy(
    options: SetupOptions,
    details: &DeploymentDetails,
    prompter: &mut dyn SecretPrompter,
    store: &mut dyn StageVariableStore,
) -> Result<String, SetupError> {
    if let Some(mode) = options.mode() {
        for line in setup_banner(mode, details) {
            prompter.announce(&line);
        }

        let prompted = mode.prompted_variables();
        let labels = prompted.iter().filter_map(|var| var.prompt_label()).collect::<Vec<_>>();
        let mut answers = prompter.prompt(&labels)?.into_iter();

        let mut variables = Vec::with_capacity(mode.required_variables().len());
        for variable in mode.required_variables() {
            let value = match variable.prompt_label() {
                Some(label) => answers.next().ok_or(SetupError::MissingAnswer(label))?,
                None => details.landing_url(),
            };
            variables.push((*variable, value));
        }

        store.deploy(&StageDeployment {
            rest_api_id: details.api_id.clone(),
            stage_name: details.stage_name.clone(),
            variables,
        })?;
    }

    Ok(details.slash_command_url())
}
