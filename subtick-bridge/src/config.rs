//! TOML config file support.
//!
//! Location: `$SUBTICK_CONFIG`, else `<config dir>/subtick/subtick.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use subtick_core::color::ParseRgbError;
use subtick_core::{Rgb, TickerSettings};
use subtick_io::ReconnectPolicy;

pub const CONFIG_ENV: &str = "SUBTICK_CONFIG";
pub const CONFIG_FILE_NAME: &str = "subtick.toml";
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9000";

/// Files bigger than this are not config files.
const MAX_FILE_SIZE: u64 = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is too large ({size} bytes)", path.display())]
    TooLarge { path: PathBuf, size: u64 },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid initial-color: {0}")]
    Color(#[from] ParseRgbError),
}

/// User-facing config parsed from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct TickerConfig {
    /// `host:port` of the subtitle feed, optionally `socket://` prefixed.
    pub address: String,
    /// Pause after each spaced word. 0 shows text as fast as it arrives.
    pub pacing_ms: u64,
    /// `#RRGGBB` color of text before the first color directive.
    pub initial_color: String,
    /// Blank space kept above and below the text, in rows.
    pub vertical_margin: u32,
    /// Log destination. Logs go to stderr when unset, which the alternate
    /// screen hides.
    pub log_file: Option<PathBuf>,
    pub reconnect: ReconnectPolicy,
}

impl Default for TickerConfig {
    fn default() -> Self {
        let settings = TickerSettings::default();
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            pacing_ms: settings.pacing.as_millis() as u64,
            initial_color: settings.initial_color.to_string(),
            vertical_margin: 0,
            log_file: None,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl TickerConfig {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path`. A missing file gives the defaults; anything else that
    /// goes wrong is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let size = content.len() as u64;
        if size > MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge {
                path: path.to_path_buf(),
                size,
            });
        }

        Self::parse(&content, path)
    }

    /// Load from the resolved config path, or defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// A command-line address wins over the file.
    pub fn with_address_override(mut self, address: Option<String>) -> Self {
        if let Some(address) = address.filter(|a| !a.trim().is_empty()) {
            self.address = address;
        }
        self
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn initial_color(&self) -> Result<Rgb, ConfigError> {
        Ok(self.initial_color.trim().parse()?)
    }

    pub fn ticker_settings(&self) -> Result<TickerSettings, ConfigError> {
        Ok(TickerSettings {
            pacing: self.pacing(),
            initial_color: self.initial_color()?,
        })
    }
}

/// `$SUBTICK_CONFIG` if set, else the platform config directory.
pub fn config_path() -> Option<PathBuf> {
    resolve_config_path(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

pub fn resolve_config_path(env_override: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = env_override.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    directories::ProjectDirs::from("", "", "subtick")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
