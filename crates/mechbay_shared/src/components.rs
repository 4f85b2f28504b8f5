//! # System Component Types
//!
//! Engine, gyro, structure and armor types, plus the kinds of system
//! component that can claim a critical slot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SharedError;

// =============================================================================
// ENGINE & GYRO
// =============================================================================

/// Engine construction type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineType {
    /// Standard fusion engine.
    #[default]
    Standard,
    /// Extra-light fusion engine.
    #[serde(rename = "XL")]
    Xl,
    /// Light fusion engine.
    Light,
    /// Extra-extra-light fusion engine.
    #[serde(rename = "XXL")]
    Xxl,
    /// Compact fusion engine.
    Compact,
}

impl EngineType {
    /// Every engine type.
    pub const ALL: [Self; 5] = [Self::Standard, Self::Xl, Self::Light, Self::Xxl, Self::Compact];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Xl => "XL",
            Self::Light => "Light",
            Self::Xxl => "XXL",
            Self::Compact => "Compact",
        }
    }
}

/// Gyro construction type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GyroType {
    /// Standard gyro.
    #[default]
    Standard,
    /// Extra-light gyro.
    #[serde(rename = "XL")]
    Xl,
    /// Compact gyro.
    Compact,
    /// Heavy-duty gyro.
    #[serde(rename = "Heavy-Duty")]
    HeavyDuty,
}

impl GyroType {
    /// Every gyro type.
    pub const ALL: [Self; 4] = [Self::Standard, Self::Xl, Self::Compact, Self::HeavyDuty];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Xl => "XL",
            Self::Compact => "Compact",
            Self::HeavyDuty => "Heavy-Duty",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for GyroType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SharedError::UnknownEngine(s.to_string()))
    }
}

impl FromStr for GyroType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SharedError::UnknownGyro(s.to_string()))
    }
}

// =============================================================================
// SLOT-CLAIMING SYSTEM COMPONENTS
// =============================================================================

/// A non-equipment component that can occupy a critical slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemComponentKind {
    /// Engine (depends on engine/gyro configuration).
    Engine,
    /// Gyro (depends on gyro configuration).
    Gyro,
    /// Arm or leg actuator.
    Actuator,
    /// Life support.
    LifeSupport,
    /// Sensors.
    Sensors,
    /// Cockpit.
    Cockpit,
}

impl SystemComponentKind {
    /// Generic display name used when a slot has no specific component name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Engine => "Engine",
            Self::Gyro => "Gyro",
            Self::Actuator => "Actuator",
            Self::LifeSupport => "Life Support",
            Self::Sensors => "Sensors",
            Self::Cockpit => "Cockpit",
        }
    }

    /// Engine and gyro slots move with the configuration; everything else is
    /// fixed chassis data.
    #[inline]
    #[must_use]
    pub const fn is_configuration_dependent(self) -> bool {
        matches!(self, Self::Engine | Self::Gyro)
    }
}

impl fmt::Display for SystemComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// STRUCTURE & ARMOR
// =============================================================================

/// Internal structure type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureType {
    /// Standard structure, no critical slots.
    #[default]
    Standard,
    /// Inner Sphere endo steel.
    #[serde(rename = "Endo Steel")]
    EndoSteel,
    /// Clan endo steel.
    #[serde(rename = "Endo Steel (Clan)")]
    EndoSteelClan,
}

impl StructureType {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::EndoSteel => "Endo Steel",
            Self::EndoSteelClan => "Endo Steel (Clan)",
        }
    }

    /// Number of one-slot pieces this structure spreads over the chassis.
    #[must_use]
    pub const fn critical_pieces(self) -> usize {
        match self {
            Self::Standard => 0,
            Self::EndoSteel => 14,
            Self::EndoSteelClan => 7,
        }
    }
}

/// Armor type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorType {
    /// Standard armor, no critical slots.
    #[default]
    Standard,
    /// Inner Sphere ferro-fibrous.
    #[serde(rename = "Ferro-Fibrous")]
    FerroFibrous,
    /// Clan ferro-fibrous.
    #[serde(rename = "Ferro-Fibrous (Clan)")]
    FerroFibrousClan,
}

impl ArmorType {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::FerroFibrous => "Ferro-Fibrous",
            Self::FerroFibrousClan => "Ferro-Fibrous (Clan)",
        }
    }

    /// Number of one-slot pieces this armor spreads over the chassis.
    #[must_use]
    pub const fn critical_pieces(self) -> usize {
        match self {
            Self::Standard => 0,
            Self::FerroFibrous => 14,
            Self::FerroFibrousClan => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_round_trip_names() {
        for engine in EngineType::ALL {
            assert_eq!(engine.name().parse::<EngineType>().unwrap(), engine);
        }
        assert!("Fuel Cell".parse::<EngineType>().is_err());
    }

    #[test]
    fn test_gyro_parse_heavy_duty() {
        assert_eq!("heavy-duty".parse::<GyroType>().unwrap(), GyroType::HeavyDuty);
    }

    #[test]
    fn test_configuration_dependent_kinds() {
        assert!(SystemComponentKind::Engine.is_configuration_dependent());
        assert!(SystemComponentKind::Gyro.is_configuration_dependent());
        assert!(!SystemComponentKind::Actuator.is_configuration_dependent());
    }

    #[test]
    fn test_special_piece_counts() {
        assert_eq!(StructureType::Standard.critical_pieces(), 0);
        assert_eq!(StructureType::EndoSteel.critical_pieces(), 14);
        assert_eq!(StructureType::EndoSteelClan.critical_pieces(), 7);
        assert_eq!(ArmorType::Standard.critical_pieces(), 0);
        assert_eq!(ArmorType::FerroFibrous.critical_pieces(), 14);
        assert_eq!(ArmorType::FerroFibrousClan.critical_pieces(), 7);
    }
}
