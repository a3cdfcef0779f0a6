//! Configuration loading
//!
//! Bootstrap configuration comes from a single TOML file. Every field has a
//! built-in default, so a missing file or a missing section never prevents
//! startup.
//!
//! Config file resolution order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. `<user config dir>/cadence/config.toml`
//! 4. Built-in defaults (no file)

use crate::events::RepeatMode;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CADENCE_CONFIG";

/// Lower bound for the position timer period
pub const MIN_POSITION_INTERVAL_MS: u64 = 50;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Base folder for relative track locators
    pub root_folder: Option<PathBuf>,

    /// Initial playback preferences
    pub playback: PlaybackDefaults,

    /// HTTP control surface
    pub server: ServerConfig,

    pub logging: LoggingConfig,
}

/// Initial shuffle/repeat/speed preferences for a new playback session
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackDefaults {
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
    pub speed: f32,
    /// Period of position updates while playing
    pub position_interval_ms: u64,
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat_mode: RepeatMode::Off,
            speed: 1.0,
            position_interval_ms: 1000,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let speed = self.playback.speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::Config(format!(
                "playback.speed must be a positive number, got {}",
                speed
            )));
        }

        if self.playback.position_interval_ms < MIN_POSITION_INTERVAL_MS {
            return Err(Error::Config(format!(
                "playback.position_interval_ms must be at least {}, got {}",
                MIN_POSITION_INTERVAL_MS, self.playback.position_interval_ms
            )));
        }

        if self.server.host.trim().is_empty() {
            return Err(Error::Config("server.host must not be empty".to_string()));
        }

        Ok(())
    }

    /// Root folder for relative locators, falling back to the platform audio dir
    pub fn root_folder_or_default(&self) -> PathBuf {
        self.root_folder
            .clone()
            .or_else(dirs::audio_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Pick the config file to load, if any
///
/// Returns `None` when neither an explicit path nor the per-user default file
/// exists, meaning built-in defaults apply.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    default_config_path().filter(|path| path.exists())
}

/// `<user config dir>/cadence/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cadence").join("config.toml"))
}
