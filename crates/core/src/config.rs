use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_OAUTH_ACCESS_URL: &str = "https://slack.com/api/oauth.access";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Stage credentials read by the request handlers.
#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub token: SecretString,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub home_page_url: Option<String>,
    pub redirect_url: Option<String>,
    pub oauth_access_url: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub slack_token: Option<String>,
    pub slack_client_id: Option<String>,
    pub slack_client_secret: Option<String>,
    pub slack_home_page_url: Option<String>,
    pub slack_redirect_url: Option<String>,
    pub slack_oauth_access_url: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Borrowed view of the OAuth install credentials, available only when every
/// field is configured.
#[derive(Clone, Copy, Debug)]
pub struct InstallCredentials<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a SecretString,
    pub redirect_url: &'a str,
    pub home_page_url: &'a str,
    pub oauth_access_url: &'a str,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig {
                token: String::new().into(),
                client_id: None,
                client_secret: None,
                home_page_url: None,
                redirect_url: None,
                oauth_access_url: DEFAULT_OAUTH_ACCESS_URL.to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl SlackConfig {
    pub fn install_credentials(&self) -> Option<InstallCredentials<'_>> {
        Some(InstallCredentials {
            client_id: self.client_id.as_deref()?,
            client_secret: self.client_secret.as_ref()?,
            redirect_url: self.redirect_url.as_deref()?,
            home_page_url: self.home_page_url.as_deref()?,
            oauth_access_url: &self.oauth_access_url,
        })
    }

    pub fn install_configured(&self) -> bool {
        self.install_credentials().is_some()
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("slashgate.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(token) = slack.token {
                self.slack.token = secret_value(token);
            }
            if let Some(client_id) = slack.client_id {
                self.slack.client_id = Some(client_id);
            }
            if let Some(client_secret) = slack.client_secret {
                self.slack.client_secret = Some(secret_value(client_secret));
            }
            if let Some(home_page_url) = slack.home_page_url {
                self.slack.home_page_url = Some(home_page_url);
            }
            if let Some(redirect_url) = slack.redirect_url {
                self.slack.redirect_url = Some(redirect_url);
            }
            if let Some(oauth_access_url) = slack.oauth_access_url {
                self.slack.oauth_access_url = oauth_access_url;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SLASHGATE_SLACK_TOKEN") {
            self.slack.token = secret_value(value);
        }
        if let Some(value) = read_env("SLASHGATE_SLACK_CLIENT_ID") {
            self.slack.client_id = Some(value);
        }
        if let Some(value) = read_env("SLASHGATE_SLACK_CLIENT_SECRET") {
            self.slack.client_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("SLASHGATE_SLACK_HOME_PAGE_URL") {
            self.slack.home_page_url = Some(value);
        }
        if let Some(value) = read_env("SLASHGATE_SLACK_REDIRECT_URL") {
            self.slack.redirect_url = Some(value);
        }
        if let Some(value) = read_env("SLASHGATE_SLACK_OAUTH_ACCESS_URL") {
            self.slack.oauth_access_url = value;
        }

        if let Some(value) = read_env("SLASHGATE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SLASHGATE_SERVER_PORT") {
            self.server.port = parse_u16("SLASHGATE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SLASHGATE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SLASHGATE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("SLASHGATE_LOGGING_LEVEL").or_else(|| read_env("SLASHGATE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SLASHGATE_LOGGING_FORMAT").or_else(|| read_env("SLASHGATE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(token) = overrides.slack_token {
            self.slack.token = secret_value(token);
        }
        if let Some(client_id) = overrides.slack_client_id {
            self.slack.client_id = Some(client_id);
        }
        if let Some(client_secret) = overrides.slack_client_secret {
            self.slack.client_secret = Some(secret_value(client_secret));
        }
        if let Some(home_page_url) = overrides.slack_home_page_url {
            self.slack.home_page_url = Some(home_page_url);
        }
        if let Some(redirect_url) = overrides.slack_redirect_url {
            self.slack.redirect_url = Some(redirect_url);
        }
        if let Some(oauth_access_url) = overrides.slack_oauth_access_url {
            self.slack.oauth_access_url = oauth_access_url;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slack(&self.slack)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("slashgate.toml"), PathBuf::from("config/slashgate.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    if slack.token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "slack.token is required. Copy the verification token from https://api.slack.com/apps > Your App > Basic Information".to_string(),
        ));
    }

    let install_fields = [
        ("slack.client_id", slack.client_id.is_some()),
        ("slack.client_secret", slack.client_secret.is_some()),
        ("slack.home_page_url", slack.home_page_url.is_some()),
        ("slack.redirect_url", slack.redirect_url.is_some()),
    ];
    let configured = install_fields.iter().filter(|(_, present)| *present).count();
    if configured > 0 && configured < install_fields.len() {
        let missing = install_fields
            .iter()
            .filter(|(_, present)| !*present)
            .map(|(key, _)| *key)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ConfigError::Validation(format!(
            "slack app install is partially configured; missing {missing}"
        )));
    }

    for (key, value) in [
        ("slack.home_page_url", slack.home_page_url.as_deref()),
        ("slack.redirect_url", slack.redirect_url.as_deref()),
        ("slack.oauth_access_url", Some(slack.oauth_access_url.as_str())),
    ] {
        if let Some(url) = value {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "{key} must start with http:// or https://"
                )));
            }
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    home_page_url: Option<String>,
    redirect_url: Option<String>,
    oauth_access_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
