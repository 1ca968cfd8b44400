//! Application configuration management.
//!
//! Configuration is layered: compiled defaults, then an optional TOML file,
//! then `CHECK_IMU__*` environment variables, then CLI overrides applied by
//! the caller.

use crate::cli::Cli;
use crate::error::{ConfigError, Result};
use ::config::{Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "check-imu.toml";

/// Slowest supported native frame rate
pub const MIN_RATE_HZ: f64 = 1e-3;

/// Fastest supported native frame rate
pub const MAX_RATE_HZ: f64 = 1e6;

/// Prefix of environment overrides, e.g. `CHECK_IMU__SOURCE__RATE_HZ`
pub const ENV_PREFIX: &str = "CHECK_IMU";

/// Top-level application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Which capture back end to open
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Simulated,
    Replay,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simulated" => Ok(SourceKind::Simulated),
            "replay" => Ok(SourceKind::Replay),
            other => Err(format!(
                "unknown source '{}' (expected simulated or replay)",
                other
            )),
        }
    }
}

/// Capture source configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,
    #[serde(default = "default_frame_timeout")]
    pub frame_timeout_ms: u64,
    #[serde(default)]
    pub replay_file: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub loop_playback: bool,
    #[serde(default)]
    pub disconnect_after: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub json: bool,
}

/// Terminal output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

// Default value functions
fn default_source_kind() -> SourceKind {
    SourceKind::Simulated
}

fn default_rate_hz() -> f64 {
    200.0
}

fn default_frame_timeout() -> u64 {
    15000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            rate_hz: default_rate_hz(),
            frame_timeout_ms: default_frame_timeout(),
            replay_file: None,
            loop_playback: true,
            disconnect_after: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            json: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { clear_screen: true }
    }
}

impl SourceConfig {
    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

impl LoggingConfig {
    /// Parsed log level
    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.level).map_err(|_| {
            ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                message: format!(
                    "'{}' is not one of off, error, warn, info, debug, trace",
                    self.level
                ),
            }
            .into()
        })
    }
}

impl AppConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] if it
    /// exists, layered under the process environment.
    ///
    /// The result is not validated: CLI overrides are the last layer, so call
    /// [`AppConfig::validate`] after [`AppConfig::apply_cli_overrides`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`], reading overrides from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<::config::Map<String, String>>,
    ) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: AppConfig = ::config::Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RATE_HZ..=MAX_RATE_HZ).contains(&self.source.rate_hz) {
            return Err(ConfigError::InvalidValue {
                field: "source.rate_hz".to_string(),
                message: format!("must be between {} and {}", MIN_RATE_HZ, MAX_RATE_HZ),
            }
            .into());
        }

        if self.source.frame_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "source.frame_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.source.kind == SourceKind::Replay && self.source.replay_file.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "source.replay_file".to_string(),
                message: "required when source.kind is replay".to_string(),
            }
            .into());
        }

        self.logging.level_filter()?;
        Ok(())
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(kind) = cli.source {
            self.source.kind = kind;
        }

        if let Some(path) = &cli.replay {
            self.source.kind = SourceKind::Replay;
            self.source.replay_file = Some(path.clone());
        }

        if let Some(rate) = cli.rate {
            self.source.rate_hz = rate;
        }

        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
    }
}
