//! # MECHBAY Shared
//!
//! Value types exchanged between the equipment catalog, the unit editor and
//! the criticals core.
//!
//! ## RULE
//!
//! This crate holds data and static chassis tables only. Anything that
//! places, moves or displaces equipment belongs in `mechbay_criticals`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod components;
pub mod constants;
pub mod equipment;
pub mod location;
pub mod unit;

use thiserror::Error;

pub use components::{ArmorType, EngineType, GyroType, StructureType, SystemComponentKind};
pub use constants::{layout, FixedComponent, LocationLayout, CENTER_TORSO_SLOTS, MAX_LOCATION_SLOTS};
pub use equipment::{EquipmentCategory, EquipmentDefinition, SpecialComponent, TechBase};
pub use location::Location;
pub use unit::{UnitConfiguration, UnitType};

/// Errors raised while parsing or constructing shared values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Location name or abbreviation not recognised.
    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// Engine type name not recognised.
    #[error("unknown engine type: {0}")]
    UnknownEngine(String),

    /// Gyro type name not recognised.
    #[error("unknown gyro type: {0}")]
    UnknownGyro(String),

    /// Equipment definition declares zero critical slots.
    #[error("equipment {0} must require at least one slot")]
    ZeroSlots(String),
}

/// Result type for shared value construction.
pub type SharedResult<T> = Result<T, SharedError>;
