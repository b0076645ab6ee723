//! Configuration management for feedwatch.
//!
//! Configuration is read from `~/.config/feedwatch/config.toml` (or the path
//! given with `--config`). If the default file doesn't exist, a commented
//! default configuration is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAILGUN_API_BASE: &str = "https://api.mailgun.net/v3";
pub const DEFAULT_PAGE_USER_AGENT: &str = "Mozilla/5.0 (compatible; feedwatch/0.1)";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub http: HttpConfig,
    pub daemon: DaemonSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file; defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

/// Mailgun credentials and digest addresses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub api_key: String,
    pub domain: String,
    pub from: String,
    pub recipient: String,
    pub api_base: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            domain: String::new(),
            from: String::new(),
            recipient: String::new(),
            api_base: DEFAULT_MAILGUN_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Sent when fetching pages for scraping.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_PAGE_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    /// Tick interval such as "5m", "1h" or bare seconds.
    pub interval: String,
    pub run_on_start: bool,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            interval: "5m".to_string(),
            run_on_start: true,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path.
    ///
    /// A missing default file is created with comments. An explicit path must
    /// exist. Missing fields use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/feedwatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedwatch").join("config.toml"))
    }

    /// SQLite path, creating the default data directory when needed.
    pub fn storage_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }
        let dir = dirs::data_dir()
            .ok_or(ConfigError::NoDataDir)?
            .join("feedwatch");
        fs::create_dir_all(&dir).map_err(|e| ConfigError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(dir.join("feedwatch.db"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# feedwatch configuration

[storage]
# SQLite database holding sources, seen markers and the run lock.
# Defaults to the platform data directory (e.g. ~/.local/share/feedwatch/feedwatch.db)
# path = "/var/lib/feedwatch/feedwatch.db"

[mail]
# Mailgun credentials. Digests fail to send until these are set.
api_key = ""
domain = ""
from = ""
recipient = ""
api_base = "https://api.mailgun.net/v3"

[http]
# Request timeout in seconds
timeout_secs = 30

# User-Agent sent when fetching pages for scraping
user_agent = "Mozilla/5.0 (compatible; feedwatch/0.1)"

[daemon]
# How often `feedwatch daemon` runs ("30s", "5m", "1h", "1d")
interval = "5m"

# Run once immediately on start
run_on_start = true
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
