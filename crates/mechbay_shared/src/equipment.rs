//! # Equipment Definitions
//!
//! Immutable descriptions of placeable equipment, as supplied by the
//! equipment catalog. A definition is never mutated after creation; every
//! placed instance refers to one by value.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::{ArmorType, StructureType};
use crate::{SharedError, SharedResult};

/// Broad equipment category, used for migration ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    /// Weapons.
    Weapon,
    /// Miscellaneous equipment.
    Equipment,
    /// Heat sinks.
    HeatSink,
    /// Ammunition.
    Ammo,
}

impl EquipmentCategory {
    /// Rank used when two displaced items have the same size.
    /// Lower ranks are re-placed first.
    #[inline]
    #[must_use]
    pub const fn migration_rank(self) -> u8 {
        match self {
            Self::Weapon => 1,
            Self::Equipment => 2,
            Self::HeatSink => 3,
            Self::Ammo => 4,
        }
    }
}

/// Technology base of a piece of equipment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechBase {
    /// Inner Sphere.
    #[default]
    #[serde(rename = "Inner Sphere")]
    InnerSphere,
    /// Clan.
    Clan,
    /// Usable by both.
    Both,
}

/// Marks equipment that is a piece of a chassis-wide special component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialComponent {
    /// Piece of a non-standard internal structure.
    Structure(StructureType),
    /// Piece of a non-standard armor.
    Armor(ArmorType),
}

/// An immutable equipment description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDefinition {
    /// Catalog identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Number of contiguous critical slots required.
    pub required_slots: usize,
    /// Weight in tons.
    #[serde(default)]
    pub weight: f64,
    /// Category.
    pub category: EquipmentCategory,
    /// Technology base.
    #[serde(default)]
    pub tech_base: TechBase,
    /// Heat generated (positive) or dissipated (negative).
    #[serde(default)]
    pub heat: Option<i32>,
    /// Set when this is a piece of endo steel, ferro-fibrous and the like.
    #[serde(default)]
    pub special: Option<SpecialComponent>,
}

impl EquipmentDefinition {
    /// Creates a definition.
    ///
    /// # Errors
    ///
    /// Returns `SharedError::ZeroSlots` if `required_slots` is zero; such an
    /// item could never occupy a slot range.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        required_slots: usize,
        category: EquipmentCategory,
    ) -> SharedResult<Self> {
        let id = id.into();
        if required_slots == 0 {
            return Err(SharedError::ZeroSlots(id));
        }

        Ok(Self {
            id,
            name: name.into(),
            required_slots,
            weight: 0.0,
            category,
            tech_base: TechBase::InnerSphere,
            heat: None,
            special: None,
        })
    }

    /// Sets the weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the tech base.
    #[must_use]
    pub fn with_tech_base(mut self, tech_base: TechBase) -> Self {
        self.tech_base = tech_base;
        self
    }

    /// Sets the heat value.
    #[must_use]
    pub fn with_heat(mut self, heat: i32) -> Self {
        self.heat = Some(heat);
        self
    }

    /// One-slot piece of a special structure. `index` is 1-based.
    #[must_use]
    pub fn structure_piece(structure: StructureType, index: usize) -> Self {
        Self::special_piece(structure.name(), SpecialComponent::Structure(structure), index)
    }

    /// One-slot piece of a special armor. `index` is 1-based.
    #[must_use]
    pub fn armor_piece(armor: ArmorType, index: usize) -> Self {
        Self::special_piece(armor.name(), SpecialComponent::Armor(armor), index)
    }

    fn special_piece(name: &str, special: SpecialComponent, index: usize) -> Self {
        let slug: String = name
            .chars()
            .filter(|c| !matches!(c, '(' | ')'))
            .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        let tech_base = if name.contains("Clan") {
            TechBase::Clan
        } else {
            TechBase::InnerSphere
        };

        Self {
            id: format!("{slug}_piece_{index}"),
            name: name.to_string(),
            required_slots: 1,
            weight: 0.0,
            category: EquipmentCategory::Equipment,
            tech_base,
            heat: None,
            special: Some(special),
        }
    }

    /// Returns true if this is a piece of a special structure or armor.
    #[inline]
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.special.is_some()
    }
}

impl fmt::Display for EquipmentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} slot", self.name, self.required_slots)?;
        if self.required_slots != 1 {
            f.write_str("s")?;
        }
        f.write_str(")")
    }
}
