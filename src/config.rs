//! Configuration for zonetrack.
//!
//! Zone geometry is fixed at compile time and is not part of the
//! configuration.

use crate::training::{DEFAULT_ACCURACY_THRESHOLD, DEFAULT_F1_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `data_train.csv` / `data_test.csv`
    pub data_path: PathBuf,

    /// Directory for feature tables and reports
    pub output_path: PathBuf,

    /// Path for persisted processing statistics
    pub state_path: PathBuf,

    /// Reported accuracy at which training stops
    #[serde(default = "default_accuracy_threshold")]
    pub accuracy_threshold: f64,

    /// Validation F1 at which training stops
    #[serde(default = "default_f1_threshold")]
    pub f1_threshold: f64,
}

fn default_accuracy_threshold() -> f64 {
    DEFAULT_ACCURACY_THRESHOLD
}

fn default_f1_threshold() -> f64 {
    DEFAULT_F1_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        let state_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zonetrack");

        Self {
            data_path: PathBuf::from("data"),
            output_path: PathBuf::from("output"),
            state_path: state_dir,
            accuracy_threshold: DEFAULT_ACCURACY_THRESHOLD,
            f1_threshold: DEFAULT_F1_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zonetrack")
            .join("config.json")
    }

    /// Path of the persisted processing statistics.
    pub fn processing_log_path(&self) -> PathBuf {
        self.state_path.join("processing.json")
    }

    /// Ensure output and state directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.output_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.state_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Thresholds must be usable scores in (0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("accuracy_threshold", self.accuracy_threshold),
            ("f1_threshold", self.f1_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
