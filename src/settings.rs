use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8006;
pub const DEFAULT_SERVICE: &str = "PVE";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_PREFIX: &str = "PROXMOX_MCP";

/// Searched in order when no explicit path is given; all optional.
const DEFAULT_CONFIG_NAMES: [&str; 2] = ["proxmox-config/config", "config"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("configuration file not found: {0}")]
    NotFound(String),

    #[error("missing required configuration fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Validated settings. Constructed once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Settings {
    pub proxmox: ProxmoxSettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone)]
pub struct ProxmoxSettings {
    pub host: String,
    pub port: u16,
    pub verify_ssl: bool,
    pub service: String,
    pub timeout_secs: u64,
}

impl ProxmoxSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone)]
pub struct AuthSettings {
    pub user: String,
    pub token_name: String,
    pub token_value: String,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("user", &self.user)
            .field("token_name", &self.token_name)
            .field("token_value", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    Auto,
    Emoji,
    Plain,
}

#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub theme: ThemeChoice,
}

// Raw document shape: every field optional so validation can name all gaps at once.

#[derive(Debug, Deserialize, Default)]
struct RawSettings {
    #[serde(default)]
    proxmox: RawProxmox,
    #[serde(default)]
    auth: RawAuth,
    #[serde(default)]
    logging: RawLogging,
    #[serde(default)]
    display: RawDisplay,
}

#[derive(Debug, Deserialize, Default)]
struct RawProxmox {
    host: Option<String>,
    port: Option<u16>,
    verify_ssl: Option<bool>,
    service: Option<String>,
    timeout: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawAuth {
    user: Option<String>,
    token_name: Option<String>,
    token_value: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawLogging {
    level: Option<String>,
    format: Option<LogFormat>,
    file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawDisplay {
    theme: Option<ThemeChoice>,
}

fn required(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

impl Settings {
    /// Loads from `config_path` if given (it must exist), else from the
    /// default search names, then applies `PROXMOX_MCP_<SECTION>__<KEY>`
    /// environment overrides.
    pub fn new(config_path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load(config_path, ENV_PREFIX)
    }

    fn load(config_path: Option<&str>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut s = Config::builder();

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(ConfigError::NotFound(path.to_string()));
            }
            s = s.add_source(File::with_name(path).required(true));
        } else {
            for name in DEFAULT_CONFIG_NAMES {
                s = s.add_source(File::with_name(name).required(false));
            }
        }

        s = s.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__"),
        );

        let raw: RawSettings = s.build()?.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let host = required(raw.proxmox.host, "proxmox.host", &mut missing);
        let user = required(raw.auth.user, "auth.user", &mut missing);
        let token_name = required(raw.auth.token_name, "auth.token_name", &mut missing);
        let token_value = required(raw.auth.token_value, "auth.token_value", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::MissingFields(missing));
        }

        let port = raw.proxmox.port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "proxmox.port",
                reason: "must be between 1 and 65535".to_string(),
            });
        }
        let timeout_secs = raw.proxmox.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "proxmox.timeout",
                reason: "must be at least one second".to_string(),
            });
        }

        Ok(Settings {
            proxmox: ProxmoxSettings {
                host,
                port,
                verify_ssl: raw.proxmox.verify_ssl.unwrap_or(false),
                service: raw
                    .proxmox
                    .service
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
                timeout_secs,
            },
            auth: AuthSettings {
                user,
                token_name,
                token_value,
            },
            logging: LoggingSettings {
                level: raw.logging.level.unwrap_or_else(|| "INFO".to_string()),
                format: raw.logging.format.unwrap_or(LogFormat::Text),
                file: raw.logging.file.filter(|f| !f.is_empty()),
            },
            display: DisplaySettings {
                theme: raw.display.theme.unwrap_or(ThemeChoice::Auto),
            },
        })
    }
}
