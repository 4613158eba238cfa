//! TOML configuration for the agent.
//!
//! Read from `--config <path>` or the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Keystrokes\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/keystrokes/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/Keystrokes/config.toml`
//!
//! Every field has a default, and a missing file yields
//! `AgentConfig::default()`, so the agent works before any config exists.
//!
//! ```toml
//! [agent]
//! log_level = "debug"
//! max_macro_depth = 32
//! start_delay_ms = 500
//!
//! [timing]
//! key_settle_ms = 100
//! click_settle_ms = 50
//! double_click_gap_ms = 50
//!
//! [macros]
//! unlock = [
//!     { type = "keystroke", mode = "simultaneous", keys = ["CTRL", "ALT", "DELETE"] },
//!     { type = "sleep", ms = 1000 },
//! ]
//! ```
//!
//! Macro bodies use the same field names as the JSON command format.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keystrokes_core::MacroRegistry;
use serde::Deserialize;
use thiserror::Error;

use crate::application::run_macro::DEFAULT_MAX_MACRO_DEPTH;
use crate::application::synthesize::SettleTimings;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Macros available to every command.
    #[serde(default)]
    pub macros: MacroRegistry,
}

/// General agent behaviour.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentSection {
    /// `tracing` log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How many macro calls may be nested inside one another.
    #[serde(default = "default_max_macro_depth")]
    pub max_macro_depth: usize,
    /// Pause before a directly executed command starts.  Gives a freshly
    /// launched child time for the desktop to accept input.
    #[serde(default)]
    pub start_delay_ms: u64,
}

/// Settle times between injected input edges, in milliseconds.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_key_settle_ms")]
    pub key_settle_ms: u64,
    #[serde(default = "default_click_settle_ms")]
    pub click_settle_ms: u64,
    #[serde(default = "default_double_click_gap_ms")]
    pub double_click_gap_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_macro_depth() -> usize {
    DEFAULT_MAX_MACRO_DEPTH
}
fn default_key_settle_ms() -> u64 {
    100
}
fn default_click_settle_ms() -> u64 {
    50
}
fn default_double_click_gap_ms() -> u64 {
    50
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_macro_depth: default_max_macro_depth(),
            start_delay_ms: 0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            key_settle_ms: default_key_settle_ms(),
            click_settle_ms: default_click_settle_ms(),
            double_click_gap_ms: default_double_click_gap_ms(),
        }
    }
}

impl AgentSection {
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

impl TimingConfig {
    pub fn settle_timings(&self) -> SettleTimings {
        SettleTimings {
            key: Duration::from_millis(self.key_settle_ms),
            click: Duration::from_millis(self.click_settle_ms),
            double_click_gap: Duration::from_millis(self.double_click_gap_ms),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from `path`, or from the platform default when
/// `path` is `None`.
///
/// A missing default file yields `AgentConfig::default()`.  An explicitly
/// given path must exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AgentConfig, ConfigError> {
    match path {
        Some(path) => read_config(path),
        None => match config_file_path() {
            Ok(path) => load_config_or_default(&path),
            Err(ConfigError::NoPlatformConfigDir) => {
                tracing::debug!("config: no platform config directory, using defaults");
                Ok(AgentConfig::default())
            }
            Err(e) => Err(e),
        },
    }
}

/// Returns the absolute path of the file [`load_config`] reads for `explicit`,
/// or `None` when defaults are used because no file exists.
///
/// A relaunched child gets this path so it runs with the parent's settings
/// rather than whatever its own user profile holds.
pub fn effective_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path().ok().filter(|path| path.is_file())?,
    };
    if path.is_absolute() {
        Some(path)
    } else {
        std::env::current_dir().ok().map(|cwd| cwd.join(path))
    }
}

/// Loads `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Same as [`load_config`], except "not found" is not an error.
pub fn load_config_or_default(path: &Path) -> Result<AgentConfig, ConfigError> {
    match read_config(path) {
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Ok(AgentConfig::default())
        }
        other => other,
    }
}

fn read_config(path: &Path) -> Result<AgentConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: AgentConfig = toml::from_str(&content)?;
    Ok(cfg)
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Keystrokes"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keystrokes"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Keystrokes")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
