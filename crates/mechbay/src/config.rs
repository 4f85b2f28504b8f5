//! Controller configuration loaded from TOML.
//!
//! # TOML Example
//!
//! ```toml
//! history_limit = 100
//! feed_capacity = 256
//!
//! [reconstruction]
//! mode = "migrate"
//! preserve_location = true
//!
//! [unit]
//! engine_type = "XL"
//! gyro_type = "Standard"
//! mass = 55
//! ```

use mechbay_criticals::{rules, ReconstructionOptions};
use mechbay_shared::UnitConfiguration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default number of change log entries kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default change feed capacity.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration file not found at the given path.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// File unreadable or TOML invalid.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Parsed, but the values make no sense.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Settings for a [`crate::UnitStateController`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Change log entries kept; oldest are dropped first.
    pub history_limit: usize,
    /// Change feed capacity. Events beyond it are dropped.
    pub feed_capacity: usize,
    /// How engine/gyro changes migrate equipment.
    pub reconstruction: ReconstructionOptions,
    /// Unit built at startup and on reset without an explicit configuration.
    pub unit: UnitConfiguration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            feed_capacity: DEFAULT_FEED_CAPACITY,
            reconstruction: ReconstructionOptions::default(),
            unit: UnitConfiguration::default(),
        }
    }
}

impl ControllerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// * `ConfigError::ParseError` if the TOML is invalid.
    /// * `ConfigError::ValidationError` if [`ControllerConfig::validate`] fails.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// * `ConfigError::FileNotFound` if `path` does not exist.
    /// * Otherwise as [`ControllerConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks the values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `history_limit` or `feed_capacity` is zero
    /// - the unit's engine/gyro combination does not fit
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "history_limit must be greater than zero".to_string(),
            ));
        }
        if self.feed_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "feed_capacity must be greater than zero".to_string(),
            ));
        }

        let combination = rules::validate_combination(self.unit.engine_type, self.unit.gyro_type);
        if !combination.is_valid() {
            return Err(ConfigError::ValidationError(combination.errors.join("; ")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechbay_criticals::MigrationMode;
    use mechbay_shared::{EngineType, GyroType};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = ControllerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.feed_capacity, 256);
    }

    #[test]
    fn test_full_document() {
        let config = ControllerConfig::from_toml_str(
            r#"
            history_limit = 10

            [reconstruction]
            mode = "displace_conflicts"

            [unit]
            engine_type = "XL"
            gyro_type = "Compact"
            mass = 55
            "#,
        )
        .unwrap();

        assert_eq!(config.history_limit, 10);
        assert_eq!(config.feed_capacity, DEFAULT_FEED_CAPACITY);
        assert_eq!(config.reconstruction.mode, MigrationMode::DisplaceConflicts);
        assert!(config.reconstruction.preserve_location);
        assert_eq!(config.unit.engine_type, EngineType::Xl);
        assert_eq!(config.unit.gyro_type, GyroType::Compact);
        assert_eq!(config.unit.mass, 55);
    }

    #[test]
    fn test_zero_history_rejected() {
        let err = ControllerConfig::from_toml_str("history_limit = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_bad_toml_rejected() {
        let err = ControllerConfig::from_toml_str("history_limit = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "feed_capacity = 8").unwrap();
        let config = ControllerConfig::load(file.path()).unwrap();
        assert_eq!(config.feed_capacity, 8);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(
            ControllerConfig::load(&path),
            Err(ConfigError::FileNotFound(path.clone()))
        );
    }
}
