//! Configuration loading and typed config structures.
//!
//! The configuration lives in `signalbox-config.yaml`. Every field has a
//! default, so a missing file or a partial file is valid.
//!
//! ```yaml
//! light:
//!   cycle_min_ms: 4000
//!   cycle_max_ms: 6000
//!   cycle_step_ms: 1000
//!   removal_order: lifo
//! simulation:
//!   lights: 1
//!   vehicles: 3
//!   run_seconds: 30
//! logging:
//!   level: info
//!   format: text
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::queue::RemovalOrder;
use crate::timing::{CycleTiming, TimingError};

/// Environment variable overriding [`LoggingConfig::format`].
pub const LOG_FORMAT_ENV: &str = "SIGNALBOX_LOG_FORMAT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The light timing section describes no valid interval set.
    #[error("invalid light timing: {source}")]
    Timing {
        /// The underlying timing error.
        #[from]
        source: TimingError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SignalboxConfig {
    /// Per-light timing and notification settings.
    #[serde(default)]
    pub light: LightConfig,

    /// Engine run parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SignalboxConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `SIGNALBOX_LOG_FORMAT` overrides `logging.format` when set to a
    /// recognized value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Timing`] if the light timing is inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Timing`] if the light timing is inconsistent.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.light.timing()?;
        Ok(config)
    }
}

/// Light timing and notification settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LightConfig {
    /// Shortest phase hold in milliseconds.
    #[serde(default = "default_cycle_min_ms")]
    pub cycle_min_ms: u64,

    /// Longest phase hold in milliseconds.
    #[serde(default = "default_cycle_max_ms")]
    pub cycle_max_ms: u64,

    /// Spacing between candidate hold times in milliseconds.
    #[serde(default = "default_cycle_step_ms")]
    pub cycle_step_ms: u64,

    /// Which notification a waiter receives first when several are queued.
    #[serde(default)]
    pub removal_order: RemovalOrder,

    /// Seed for the interval generator. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl LightConfig {
    /// Build the [`CycleTiming`] described by this section.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError`] if the bounds are inconsistent.
    pub const fn timing(&self) -> Result<CycleTiming, TimingError> {
        CycleTiming::from_millis(self.cycle_min_ms, self.cycle_max_ms, self.cycle_step_ms)
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            cycle_min_ms: default_cycle_min_ms(),
            cycle_max_ms: default_cycle_max_ms(),
            cycle_step_ms: default_cycle_step_ms(),
            removal_order: RemovalOrder::default(),
            seed: None,
        }
    }
}

/// Engine run parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Number of independent lights to run.
    #[serde(default = "default_lights")]
    pub lights: u32,

    /// Number of vehicle tasks waiting at each light.
    #[serde(default = "default_vehicles")]
    pub vehicles: u32,

    /// Wall-clock run length in seconds (0 = until interrupted).
    #[serde(default = "default_run_seconds")]
    pub run_seconds: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lights: default_lights(),
            vehicles: default_vehicles(),
            run_seconds: default_run_seconds(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse a format name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Override the format from `SIGNALBOX_LOG_FORMAT` when it names a
    /// known format.
    pub fn apply_env_overrides(&mut self) {
        if let Some(format) = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .as_deref()
            .and_then(LogFormat::from_name)
        {
            self.format = format;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

const fn default_cycle_min_ms() -> u64 {
    CycleTiming::DEFAULT_MIN_MS
}

const fn default_cycle_max_ms() -> u64 {
    CycleTiming::DEFAULT_MAX_MS
}

const fn default_cycle_step_ms() -> u64 {
    CycleTiming::DEFAULT_STEP_MS
}

const fn default_lights() -> u32 {
    1
}

const fn default_vehicles() -> u32 {
    3
}

const fn default_run_seconds() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SignalboxConfig::default();
        assert_eq!(config.light.timing().unwrap(), CycleTiming::default());
        assert_eq!(config.light.removal_order, RemovalOrder::Lifo);
        assert_eq!(config.simulation.lights, 1);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
light:
  cycle_min_ms: 100
  cycle_max_ms: 300
  cycle_step_ms: 50
  removal_order: fifo
  seed: 17
simulation:
  lights: 2
  vehicles: 5
  run_seconds: 0
logging:
  level: debug
  format: json
";
        let config = SignalboxConfig::parse(yaml).unwrap();
        assert_eq!(config.light.cycle_min_ms, 100);
        assert_eq!(config.light.removal_order, RemovalOrder::Fifo);
        assert_eq!(config.light.seed, Some(17));
        assert_eq!(config.simulation.vehicles, 5);
        assert_eq!(config.simulation.run_seconds, 0);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = SignalboxConfig::parse("simulation:\n  vehicles: 1\n").unwrap();
        assert_eq!(config.simulation.vehicles, 1);
        assert_eq!(config.simulation.lights, 1);
        assert_eq!(config.light, LightConfig::default());
    }

    #[test]
    fn empty_mapping_is_default() {
        let config = SignalboxConfig::parse("{}").unwrap();
        assert_eq!(config, SignalboxConfig::default());
    }

    #[test]
    fn inverted_timing_is_rejected() {
        let yaml = "light:\n  cycle_min_ms: 5000\n  cycle_max_ms: 1000\n";
        let err = SignalboxConfig::parse(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Timing { .. }));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let err = SignalboxConfig::parse("light: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SignalboxConfig::from_file(Path::new("/nonexistent/signalbox.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn log_format_names() {
        assert_eq!(LogFormat::from_name("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_name("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::from_name("xml"), None);
    }
}
