use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TWILIO_ACCOUNT_SID: &str = "your_default_account_id";
pub const DEFAULT_TWILIO_AUTH_TOKEN: &str = "your_default_token";
pub const DEFAULT_TWILIO_FROM_NUMBER: &str = "whatsapp:+14155238886";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub twilio: TwilioConfig,
    pub marketstack: MarketstackConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub from_number: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MarketstackConfig {
    pub access_key: Option<SecretString>,
    pub base_url: String,
    pub timeout_secs: u64,
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
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from_number: Option<String>,
    pub twilio_api_base_url: Option<String>,
    pub marketstack_access_key: Option<String>,
    pub marketstack_base_url: Option<String>,
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: 5001 },
            twilio: TwilioConfig {
                account_sid: DEFAULT_TWILIO_ACCOUNT_SID.to_string(),
                auth_token: secret_value(DEFAULT_TWILIO_AUTH_TOKEN.to_string()),
                from_number: DEFAULT_TWILIO_FROM_NUMBER.to_string(),
                api_base_url: "https://api.twilio.com".to_string(),
                timeout_secs: 15,
            },
            marketstack: MarketstackConfig {
                access_key: None,
                base_url: "http://api.marketstack.com/v1".to_string(),
                timeout_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
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

impl TwilioConfig {
    /// True while either credential still carries its non-functional default.
    pub fn uses_placeholder_credentials(&self) -> bool {
        self.account_sid == DEFAULT_TWILIO_ACCOUNT_SID
            || self.auth_token.expose_secret() == DEFAULT_TWILIO_AUTH_TOKEN
    }
}

impl MarketstackConfig {
    pub fn has_access_key(&self) -> bool {
        self.access_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty())
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("stockbot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(twilio) = patch.twilio {
            if let Some(account_sid) = twilio.account_sid {
                self.twilio.account_sid = account_sid;
            }
            if let Some(auth_token) = twilio.auth_token {
                self.twilio.auth_token = secret_value(auth_token);
            }
            if let Some(from_number) = twilio.from_number {
                self.twilio.from_number = from_number;
            }
            if let Some(api_base_url) = twilio.api_base_url {
                self.twilio.api_base_url = api_base_url;
            }
            if let Some(timeout_secs) = twilio.timeout_secs {
                self.twilio.timeout_secs = timeout_secs;
            }
        }

        if let Some(marketstack) = patch.marketstack {
            if let Some(access_key) = marketstack.access_key {
                self.marketstack.access_key = Some(secret_value(access_key));
            }
            if let Some(base_url) = marketstack.base_url {
                self.marketstack.base_url = base_url;
            }
            if let Some(timeout_secs) = marketstack.timeout_secs {
                self.marketstack.timeout_secs = timeout_secs;
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
        if let Some(value) = read_env("STOCKBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("STOCKBOT_SERVER_PORT") {
            self.server.port = parse_u16("STOCKBOT_SERVER_PORT", &value)?;
        }

        let account_sid =
            read_env("STOCKBOT_TWILIO_ACCOUNT_SID").or_else(|| read_env("TWILIO_ACCOUNT"));
        if let Some(value) = account_sid {
            self.twilio.account_sid = value;
        }
        let auth_token = read_env("STOCKBOT_TWILIO_AUTH_TOKEN").or_else(|| read_env("TWILIO_TOKEN"));
        if let Some(value) = auth_token {
            self.twilio.auth_token = secret_value(value);
        }
        if let Some(value) = read_env("STOCKBOT_TWILIO_FROM_NUMBER") {
            self.twilio.from_number = value;
        }
        if let Some(value) = read_env("STOCKBOT_TWILIO_API_BASE_URL") {
            self.twilio.api_base_url = value;
        }
        if let Some(value) = read_env("STOCKBOT_TWILIO_TIMEOUT_SECS") {
            self.twilio.timeout_secs = parse_u64("STOCKBOT_TWILIO_TIMEOUT_SECS", &value)?;
        }

        let access_key =
            read_env("STOCKBOT_MARKETSTACK_ACCESS_KEY").or_else(|| read_env("MARKETSTACK_KEY"));
        if let Some(value) = access_key {
            self.marketstack.access_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("STOCKBOT_MARKETSTACK_BASE_URL") {
            self.marketstack.base_url = value;
        }
        if let Some(value) = read_env("STOCKBOT_MARKETSTACK_TIMEOUT_SECS") {
            self.marketstack.timeout_secs =
                parse_u64("STOCKBOT_MARKETSTACK_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("STOCKBOT_LOGGING_LEVEL").or_else(|| read_env("STOCKBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOCKBOT_LOGGING_FORMAT").or_else(|| read_env("STOCKBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(account_sid) = overrides.twilio_account_sid {
            self.twilio.account_sid = account_sid;
        }
        if let Some(auth_token) = overrides.twilio_auth_token {
            self.twilio.auth_token = secret_value(auth_token);
        }
        if let Some(from_number) = overrides.twilio_from_number {
            self.twilio.from_number = from_number;
        }
        if let Some(api_base_url) = overrides.twilio_api_base_url {
            self.twilio.api_base_url = api_base_url;
        }
        if let Some(access_key) = overrides.marketstack_access_key {
            self.marketstack.access_key = Some(secret_value(access_key));
        }
        if let Some(base_url) = overrides.marketstack_base_url {
            self.marketstack.base_url = base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_twilio(&self.twilio)?;
        validate_marketstack(&self.marketstack)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Returns the config file `AppConfig::load` would read for the given explicit path.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("stockbot.toml"), PathBuf::from("config/stockbot.toml")]
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

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    Ok(())
}

fn validate_twilio(twilio: &TwilioConfig) -> Result<(), ConfigError> {
    if twilio.account_sid.trim().is_empty() {
        return Err(ConfigError::Validation(
            "twilio.account_sid must not be empty (set STOCKBOT_TWILIO_ACCOUNT_SID or TWILIO_ACCOUNT)"
                .to_string(),
        ));
    }

    if twilio.from_number.trim().is_empty() {
        return Err(ConfigError::Validation(
            "twilio.from_number must not be empty (e.g. `whatsapp:+14155238886`)".to_string(),
        ));
    }

    validate_http_url("twilio.api_base_url", &twilio.api_base_url)?;
    validate_timeout("twilio.timeout_secs", twilio.timeout_secs)
}

fn validate_marketstack(marketstack: &MarketstackConfig) -> Result<(), ConfigError> {
    validate_http_url("marketstack.base_url", &marketstack.base_url)?;
    validate_timeout("marketstack.timeout_secs", marketstack.timeout_secs)
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

fn validate_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn validate_timeout(field: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 120 {
        return Err(ConfigError::Validation(format!("{field} must be in range 1..=120")));
    }
    Ok(())
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
    server: Option<ServerPatch>,
    twilio: Option<TwilioPatch>,
    marketstack: Option<MarketstackPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct TwilioPatch {
    account_sid: Option<String>,
    auth_token: Option<String>,
    from_number: Option<String>,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketstackPatch {
    access_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
