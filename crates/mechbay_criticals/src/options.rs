//! # Reconstruction Options
//!
//! How displaced equipment is treated when engine or gyro changes. Loaded
//! from TOML alongside the rest of the host configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CriticalsError, CriticalsResult};

/// What happens to equipment on a configuration change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationMode {
    /// Re-place every item by priority, looking for a new home for anything
    /// that no longer fits where it was.
    #[default]
    Migrate,
    /// Keep items that do not clash with the new reservations where they
    /// are; pool the rest.
    DisplaceConflicts,
}

/// Options for the reconstructor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionOptions {
    /// Migration strategy.
    pub mode: MigrationMode,
    /// Try each item's previous location before any other.
    pub preserve_location: bool,
}

impl Default for ReconstructionOptions {
    fn default() -> Self {
        Self {
            mode: MigrationMode::Migrate,
            preserve_location: true,
        }
    }
}

impl ReconstructionOptions {
    /// Conflict-only displacement.
    #[must_use]
    pub const fn displace_conflicts() -> Self {
        Self {
            mode: MigrationMode::DisplaceConflicts,
            preserve_location: true,
        }
    }

    /// Sets location preservation.
    #[must_use]
    pub const fn with_preserve_location(mut self, preserve: bool) -> Self {
        self.preserve_location = preserve;
        self
    }

    /// Parses options from a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::InvalidConfig` if the document does not parse.
    pub fn from_toml_str(source: &str) -> CriticalsResult<Self> {
        toml::from_str(source)
            .map_err(|e| CriticalsError::InvalidConfig(format!("reconstruction options: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReconstructionOptions::default();
        assert_eq!(options.mode, MigrationMode::Migrate);
        assert!(options.preserve_location);
        assert_eq!(ReconstructionOptions::from_toml_str("").unwrap(), options);
    }

    #[test]
    fn test_parse() {
        let options = ReconstructionOptions::from_toml_str(
            r#"
            mode = "displace_conflicts"
            preserve_location = false
            "#,
        )
        .unwrap();
        assert_eq!(options.mode, MigrationMode::DisplaceConflicts);
        assert!(!options.preserve_location);
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let err = ReconstructionOptions::from_toml_str("mode = \"teleport\"").unwrap_err();
        assert!(matches!(err, CriticalsError::InvalidConfig(_)));
    }
}
