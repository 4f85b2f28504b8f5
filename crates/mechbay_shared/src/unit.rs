//! # Unit Configuration
//!
//! The configuration-level choices that decide where system components sit.

use serde::{Deserialize, Serialize};

use crate::components::{ArmorType, EngineType, GyroType, StructureType};
use crate::equipment::TechBase;

/// Chassis class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Combat chassis.
    #[default]
    BattleMech,
    /// Industrial chassis.
    IndustrialMech,
}

/// Configuration of a unit. Only `engine_type` and `gyro_type` affect slot
/// layout; the rest is carried for callers and for special components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfiguration {
    /// Engine type.
    pub engine_type: EngineType,
    /// Gyro type.
    pub gyro_type: GyroType,
    /// Tonnage.
    pub mass: u32,
    /// Chassis class.
    pub unit_type: UnitType,
    /// Technology base.
    pub tech_base: TechBase,
    /// Internal structure.
    pub structure_type: StructureType,
    /// Armor.
    pub armor_type: ArmorType,
}

impl Default for UnitConfiguration {
    fn default() -> Self {
        Self {
            engine_type: EngineType::Standard,
            gyro_type: GyroType::Standard,
            mass: 50,
            unit_type: UnitType::BattleMech,
            tech_base: TechBase::InnerSphere,
            structure_type: StructureType::Standard,
            armor_type: ArmorType::Standard,
        }
    }
}

impl UnitConfiguration {
    /// Standard engine and gyro on a 50-ton chassis.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the engine type.
    #[must_use]
    pub const fn with_engine(mut self, engine_type: EngineType) -> Self {
        self.engine_type = engine_type;
        self
    }

    /// Sets the gyro type.
    #[must_use]
    pub const fn with_gyro(mut self, gyro_type: GyroType) -> Self {
        self.gyro_type = gyro_type;
        self
    }

    /// Sets the tonnage.
    #[must_use]
    pub const fn with_mass(mut self, mass: u32) -> Self {
        self.mass = mass;
        self
    }

    /// Sets the structure type.
    #[must_use]
    pub const fn with_structure(mut self, structure_type: StructureType) -> Self {
        self.structure_type = structure_type;
        self
    }

    /// Sets the armor type.
    #[must_use]
    pub const fn with_armor(mut self, armor_type: ArmorType) -> Self {
        self.armor_type = armor_type;
        self
    }

    /// Returns true if `other` places system components differently.
    #[inline]
    #[must_use]
    pub fn system_layout_differs(&self, other: &Self) -> bool {
        self.engine_type != other.engine_type || self.gyro_type != other.gyro_type
    }
}
