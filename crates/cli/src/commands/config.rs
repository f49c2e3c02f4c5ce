use std::env;
use std::fs;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use stockbot_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: [(&str, String, &[&str]); 12] = [
        ("server.bind_address", config.server.bind_address.clone(), &["STOCKBOT_SERVER_BIND_ADDRESS"]),
        ("server.port", config.server.port.to_string(), &["STOCKBOT_SERVER_PORT"]),
        (
            "twilio.account_sid",
            config.twilio.account_sid.clone(),
            &["STOCKBOT_TWILIO_ACCOUNT_SID", "TWILIO_ACCOUNT"],
        ),
        (
            "twilio.auth_token",
            redact_secret(Some(&config.twilio.auth_token)),
            &["STOCKBOT_TWILIO_AUTH_TOKEN", "TWILIO_TOKEN"],
        ),
        ("twilio.from_number", config.twilio.from_number.clone(), &["STOCKBOT_TWILIO_FROM_NUMBER"]),
        (
            "twilio.api_base_url",
            config.twilio.api_base_url.clone(),
            &["STOCKBOT_TWILIO_API_BASE_URL"],
        ),
        (
            "twilio.timeout_secs",
            config.twilio.timeout_secs.to_string(),
            &["STOCKBOT_TWILIO_TIMEOUT_SECS"],
        ),
        (
            "marketstack.access_key",
            redact_secret(config.marketstack.access_key.as_ref()),
            &["STOCKBOT_MARKETSTACK_ACCESS_KEY", "MARKETSTACK_KEY"],
        ),
        (
            "marketstack.base_url",
            config.marketstack.base_url.clone(),
            &["STOCKBOT_MARKETSTACK_BASE_URL"],
        ),
        (
            "marketstack.timeout_secs",
            config.marketstack.timeout_secs.to_string(),
            &["STOCKBOT_MARKETSTACK_TIMEOUT_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["STOCKBOT_LOGGING_LEVEL", "STOCKBOT_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["STOCKBOT_LOGGING_FORMAT", "STOCKBOT_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in fields {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };

    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.get(..4) {
        Some(prefix) if trimmed.len() > 8 => format!("{prefix}***"),
        _ => "<redacted>".to_string(),
    }
}
