use std::{env, fmt, fs, path};

use logger::LogFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to write config {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config path available: neither XDG_CONFIG_HOME nor HOME is set")]
    ConfigPathUnavailable,
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub worker: WorkerSection,
    pub storage: StorageSection,
    pub gateway: GatewaySection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    /// Seconds between two probing passes.
    pub check_interval_seconds: u64,
    /// Enforced by the API layer when checks are created; carried for display only.
    pub max_checks: u32,
    /// Skip launching a pipeline for a check whose previous pipeline is still running.
    pub skip_in_flight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub data_dir: path::PathBuf,
    pub logs_dir: path::PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Endpoint that accepts `{ "to", "body" }` notifications. Alerts are only logged when unset.
    pub url: Option<String>,
    pub auth_token: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: String,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self { check_interval_seconds: 60, max_checks: 5, skip_in_flight: false }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self { data_dir: ".data".into(), logs_dir: ".logs".into() }
    }
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self { url: None, auth_token: None, timeout_seconds: 10 }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".into(), format: "compact".into() }
    }
}

impl LoggingSection {
    pub fn log_format(&self) -> LogFormat {
        self.format.parse().unwrap_or_default()
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/checkwatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("checkwatch/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Worker Configuration State:")?;
        write_title_1(f, "Worker")?;
        write_1(f, "Check Interval (s)", &self.worker.check_interval_seconds)?;
        write_1(f, "Max Checks Per Owner", &self.worker.max_checks)?;
        write_1(f, "Skip In-Flight Checks", &self.worker.skip_in_flight)?;
        write_title_1(f, "Storage")?;
        write_1(f, "Data Directory", &self.storage.data_dir.display())?;
        write_1(f, "Logs Directory", &self.storage.logs_dir.display())?;
        write_title_1(f, "Gateway")?;
        write_1(f, "URL", &self.gateway.url.as_deref().unwrap_or("<log only>"))?;
        write_1(f, "Auth Token", &if self.gateway.auth_token.is_some() { "<set>" } else { "<unset>" })?;
        write_1(f, "Timeout (s)", &self.gateway.timeout_seconds)?;
        write_title_1(f, "Logging")?;
        write_1(f, "Level", &self.logging.level)?;
        write_1(f, "Format", &self.logging.format)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/checkwatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str::<Self>(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        fs::write(path, config_str)
            .map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.check_interval_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "worker.check_interval_seconds",
                reason: "must be at least 1".into(),
            });
        }
        if self.gateway.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "gateway.timeout_seconds",
                reason: "must be at least 1".into(),
            });
        }
        if let Some(url) = &self.gateway.url {
            url::Url::parse(url).map_err(|e| ConfigError::Invalid {
                field: "gateway.url",
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}
