//! Configuration management for firecheck.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fleet::CodeRules;
use crate::storage::DEFAULT_STORAGE_KEY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "firecheck";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "firecheck.db";

/// Prefix of environment overrides; nested keys are separated by `__`,
/// e.g. `FIRECHECK_SCAN__DECODE_RATE_HZ=8`.
const ENV_PREFIX: &str = "FIRECHECK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FIRECHECK_`)
/// 2. TOML config file at `~/.config/firecheck/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Scan loop configuration.
    pub scan: ScanConfig,
    /// Inspection rules.
    pub inspection: InspectionConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/firecheck/firecheck.db`
    pub database_path: Option<PathBuf>,
    /// Key the equipment collection is stored under.
    pub storage_key: String,
}

/// Scan loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Loop tick period in milliseconds (one display refresh).
    pub tick_interval_ms: u64,
    /// Maximum decode attempts per second.
    pub decode_rate_hz: u32,
    /// Side of the sampled square as a fraction of the shorter frame side.
    pub roi_fraction: f32,
    /// Side of the downscaled image handed to the decoder.
    pub sample_size: u32,
    /// Also decode the inverted image.
    pub try_both_polarities: bool,
}

/// Inspection rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Regex that every equipment code must match, e.g. `^FE-\d{3}$`.
    pub code_pattern: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            decode_rate_hz: 12,
            roi_fraction: 0.75,
            sample_size: 320,
            try_both_polarities: true,
        }
    }
}

impl ScanConfig {
    /// Get the tick interval as a Duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Minimum time between decode attempts.
    #[must_use]
    pub fn decode_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.decode_rate_hz.max(1)))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        extract(Self::figment(&config_file).merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load only defaults and the given file, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or fails validation.
    pub fn load_file(path: &Path) -> Result<Self> {
        extract(Self::figment(path))
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.storage_key.trim().is_empty() {
            return Err(invalid("storage_key must not be empty"));
        }

        let scan = &self.scan;
        if scan.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms must be greater than 0"));
        }
        if scan.decode_rate_hz == 0 {
            return Err(invalid("decode_rate_hz must be greater than 0"));
        }
        if scan.decode_rate_hz > 1000 {
            return Err(invalid(format!(
                "decode_rate_hz ({}) cannot exceed 1000",
                scan.decode_rate_hz
            )));
        }
        if scan.sample_size == 0 {
            return Err(invalid("sample_size must be greater than 0"));
        }
        if scan.roi_fraction.is_nan() || scan.roi_fraction <= 0.0 || scan.roi_fraction > 1.0 {
            return Err(invalid(format!(
                "roi_fraction ({}) must be in (0, 1]",
                scan.roi_fraction
            )));
        }

        self.code_rules().map(|_| ())
    }

    /// Build the code rules for equipment registration.
    ///
    /// # Errors
    ///
    /// Returns an error if `code_pattern` is not a valid regex.
    pub fn code_rules(&self) -> Result<CodeRules> {
        match &self.inspection.code_pattern {
            None => Ok(CodeRules::new()),
            Some(pattern) => CodeRules::with_pattern(pattern)
                .map_err(|_| invalid(format!("invalid regex pattern: {pattern}"))),
        }
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

fn extract(figment: Figment) -> Result<Config> {
    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}
