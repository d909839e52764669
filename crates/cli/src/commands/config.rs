use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use slashgate_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => render(&config),
        Err(error) => format!("config validation failed: {error}"),
    }
}

pub fn render(config: &AppConfig) -> String {
    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let slack = &config.slack;
    let fields = [
        Field {
            key: "slack.token",
            env_keys: &["SLASHGATE_SLACK_TOKEN"],
            value: redact_secret(Some(&slack.token)),
        },
        Field {
            key: "slack.client_id",
            env_keys: &["SLASHGATE_SLACK_CLIENT_ID"],
            value: optional(slack.client_id.as_deref()),
        },
        Field {
            key: "slack.client_secret",
            env_keys: &["SLASHGATE_SLACK_CLIENT_SECRET"],
            value: redact_secret(slack.client_secret.as_ref()),
        },
        Field {
            key: "slack.home_page_url",
            env_keys: &["SLASHGATE_SLACK_HOME_PAGE_URL"],
            value: optional(slack.home_page_url.as_deref()),
        },
        Field {
            key: "slack.redirect_url",
            env_keys: &["SLASHGATE_SLACK_REDIRECT_URL"],
            value: optional(slack.redirect_url.as_deref()),
        },
        Field {
            key: "slack.oauth_access_url",
            env_keys: &["SLASHGATE_SLACK_OAUTH_ACCESS_URL"],
            value: slack.oauth_access_url.clone(),
        },
        Field {
            key: "server.bind_address",
            env_keys: &["SLASHGATE_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        Field {
            key: "server.port",
            env_keys: &["SLASHGATE_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        Field {
            key: "server.graceful_shutdown_secs",
            env_keys: &["SLASHGATE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        Field {
            key: "logging.level",
            env_keys: &["SLASHGATE_LOGGING_LEVEL", "SLASHGATE_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key: "logging.format",
            env_keys: &["SLASHGATE_LOGGING_FORMAT", "SLASHGATE_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }
    lines.push(format!(
        "install flow: {}",
        if slack.install_configured() { "configured" } else { "disabled" }
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("slashgate.toml"), PathBuf::from("config/slashgate.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    let in_file = config_file_doc.is_some_and(|doc| {
        key_path.split('.').try_fold(doc, |current, key| current.get(key)).is_some()
    });
    if in_file {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn optional(value: Option<&str>) -> String {
    value.unwrap_or("<unset>").to_string()
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret.map(|secret| secret.expose_secret().trim()) {
        None => "<unset>".to_string(),
        Some("") => "<empty>".to_string(),
        Some(value) if value.chars().count() > 8 => {
            let tail = value.chars().rev().take(4).collect::<Vec<_>>();
            format!("***{}", tail.into_iter().rev().collect::<String>())
        }
        Some(_) => "<redacted>".to_string(),
    }
}
