//! Configuration for task sessions and the demo binary.
//!
//! Settings are layered with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tasksync/config.toml`)
//! 4. Compiled defaults
//!
//! A missing default config file is not an error. An explicit `--config`
//! path that doesn't exist is.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// What the session does with the visible task list when an operation
/// fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorListPolicy {
    /// Clear the visible list.
    #[default]
    Clear,
    /// Keep the last list that loaded successfully.
    Preserve,
}

impl std::str::FromStr for ErrorListPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "preserve" => Ok(Self::Preserve),
            other => Err(format!("unknown error list policy: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    session: SessionFileConfig,
    remote: RemoteFileConfig,
    logging: LoggingFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    search_debounce_ms: Option<u64>,
    sync_banner_ms: Option<u64>,
    sync_after_mutation: Option<bool>,
    error_list_policy: Option<ErrorListPolicy>,
    event_buffer: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RemoteFileConfig {
    latency_ms: Option<u64>,
    offline: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingFileConfig {
    level: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Timing and policy settings for a task session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Quiet window before a search query is applied.
    pub search_debounce: Duration,
    /// How long a successful sync stays visible before resetting.
    pub sync_banner: Duration,
    /// Run a sync after each successful mutation has been reloaded.
    pub sync_after_mutation: bool,
    /// Visible list handling on failure.
    pub error_list_policy: ErrorListPolicy,
    /// Capacity of the session's event channel.
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(1000),
            sync_banner: Duration::from_millis(2000),
            sync_after_mutation: true,
            error_list_policy: ErrorListPolicy::Clear,
            event_buffer: 64,
        }
    }
}

/// Settings for the simulated remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Delay applied to every remote call.
    pub latency: Duration,
    /// Start with the remote unreachable.
    pub offline: bool,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Session settings.
    pub session: SessionConfig,
    /// Simulated remote settings.
    pub remote: RemoteConfig,
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            remote: RemoteConfig::default(),
            log_level: "info".to_owned(),
        }
    }
}

/// Command-line and environment overrides.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CliArgs {
    /// Path to a TOML config file.
    #[arg(long, env = "TASKSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Default log filter.
    #[arg(long, env = "TASKSYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Search debounce window in milliseconds.
    #[arg(long, env = "TASKSYNC_SEARCH_DEBOUNCE_MS")]
    pub search_debounce_ms: Option<u64>,

    /// Simulated remote latency in milliseconds.
    #[arg(long, env = "TASKSYNC_REMOTE_LATENCY_MS")]
    pub remote_latency_ms: Option<u64>,

    /// Start with the simulated remote offline.
    #[arg(long, env = "TASKSYNC_OFFLINE")]
    pub offline: bool,

    /// Visible list handling on failure (`clear` or `preserve`).
    #[arg(long, env = "TASKSYNC_ERROR_LIST_POLICY")]
    pub error_list_policy: Option<ErrorListPolicy>,
}

impl AppConfig {
    /// Loads configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file exists (or was given
    /// explicitly) but cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> ConfigResult<Self> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(file, cli))
    }

    /// Parses a TOML document on top of the compiled defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseToml`] when the document is invalid.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        Ok(Self::resolve(file, &CliArgs::default()))
    }

    fn resolve(file: ConfigFile, cli: &CliArgs) -> Self {
        let defaults = Self::default();
        let session_defaults = defaults.session;

        let session = SessionConfig {
            search_debounce: cli
                .search_debounce_ms
                .or(file.session.search_debounce_ms)
                .map_or(session_defaults.search_debounce, Duration::from_millis),
            sync_banner: file
                .session
                .sync_banner_ms
                .map_or(session_defaults.sync_banner, Duration::from_millis),
            sync_after_mutation: file
                .session
                .sync_after_mutation
                .unwrap_or(session_defaults.sync_after_mutation),
            error_list_policy: cli
                .error_list_policy
                .or(file.session.error_list_policy)
                .unwrap_or(session_defaults.error_list_policy),
            event_buffer: file
                .session
                .event_buffer
                .unwrap_or(session_defaults.event_buffer)
                .max(1),
        };

        let remote = RemoteConfig {
            latency: cli
                .remote_latency_ms
                .or(file.remote.latency_ms)
                .map_or(defaults.remote.latency, Duration::from_millis),
            offline: cli.offline || file.remote.offline.unwrap_or(defaults.remote.offline),
        };

        let log_level = cli
            .log_level
            .clone()
            .or(file.logging.level)
            .unwrap_or(defaults.log_level);

        Self {
            session,
            remote,
            log_level,
        }
    }
}

/// Reads the explicit config file, or the default one when it exists.
fn load_config_file(explicit: Option<&Path>) -> ConfigResult<ConfigFile> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return Ok(ConfigFile::default()),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
            Ok(ConfigFile::default())
        }
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tasksync").join("config.toml"))
}
