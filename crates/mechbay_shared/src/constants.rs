//! # Chassis Tables
//!
//! Slot counts and fixed components for each location of a biped chassis.
//!
//! **CRITICAL:** Slot indices here are 0-based. Record sheets and every
//! user-facing message are 1-based.

use crate::components::SystemComponentKind;
use crate::location::Location;

// =============================================================================
// SLOT COUNTS
// =============================================================================

/// Slots in the head.
pub const HEAD_SLOTS: usize = 6;

/// Slots in the center torso. Engine and gyro layouts must fit inside it.
pub const CENTER_TORSO_SLOTS: usize = 12;

/// Slots in each side torso.
pub const SIDE_TORSO_SLOTS: usize = 12;

/// Slots in each arm.
pub const ARM_SLOTS: usize = 12;

/// Slots in each leg.
pub const LEG_SLOTS: usize = 6;

/// Largest location on the chassis.
pub const MAX_LOCATION_SLOTS: usize = 12;

// =============================================================================
// FIXED COMPONENTS
// =============================================================================

/// A system component that is part of the chassis itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedComponent {
    /// Name shown in the slot.
    pub name: &'static str,
    /// 0-based slot index.
    pub slot_index: usize,
    /// Whether the component may be removed by the user.
    pub removable: bool,
    /// System kind reserved for the slot.
    pub kind: SystemComponentKind,
}

impl FixedComponent {
    const fn new(name: &'static str, slot_index: usize, kind: SystemComponentKind) -> Self {
        Self {
            name,
            slot_index,
            removable: false,
            kind,
        }
    }
}

/// Static layout of one location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocationLayout {
    /// Location this layout describes.
    pub location: Location,
    /// Number of critical slots.
    pub total_slots: usize,
    /// Components present on every chassis.
    pub fixed: &'static [FixedComponent],
}

const HEAD_FIXED: [FixedComponent; 5] = [
    FixedComponent::new("Life Support", 0, SystemComponentKind::LifeSupport),
    FixedComponent::new("Sensors", 1, SystemComponentKind::Sensors),
    FixedComponent::new("Standard Cockpit", 2, SystemComponentKind::Cockpit),
    FixedComponent::new("Sensors", 4, SystemComponentKind::Sensors),
    FixedComponent::new("Life Support", 5, SystemComponentKind::LifeSupport),
];

const ARM_FIXED: [FixedComponent; 4] = [
    FixedComponent::new("Shoulder", 0, SystemComponentKind::Actuator),
    FixedComponent::new("Upper Arm Actuator", 1, SystemComponentKind::Actuator),
    FixedComponent::new("Lower Arm Actuator", 2, SystemComponentKind::Actuator),
    FixedComponent::new("Hand Actuator", 3, SystemComponentKind::Actuator),
];

const LEG_FIXED: [FixedComponent; 4] = [
    FixedComponent::new("Hip", 0, SystemComponentKind::Actuator),
    FixedComponent::new("Upper Leg Actuator", 1, SystemComponentKind::Actuator),
    FixedComponent::new("Lower Leg Actuator", 2, SystemComponentKind::Actuator),
    FixedComponent::new("Foot Actuator", 3, SystemComponentKind::Actuator),
];

/// Returns the static layout for `location`.
#[must_use]
pub const fn layout(location: Location) -> LocationLayout {
    let (total_slots, fixed): (usize, &'static [FixedComponent]) = match location {
        Location::Head => (HEAD_SLOTS, &HEAD_FIXED),
        Location::CenterTorso => (CENTER_TORSO_SLOTS, &[]),
        Location::LeftTorso | Location::RightTorso => (SIDE_TORSO_SLOTS, &[]),
        Location::LeftArm | Location::RightArm => (ARM_SLOTS, &ARM_FIXED),
        Location::LeftLeg | Location::RightLeg => (LEG_SLOTS, &LEG_FIXED),
    };

    LocationLayout {
        location,
        total_slots,
        fixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_chassis_slots() {
        let total: usize = Location::ALL.iter().map(|&l| layout(l).total_slots).sum();
        assert_eq!(total, 78);
    }

    #[test]
    fn test_fixed_components_in_range() {
        for location in Location::ALL {
            let table = layout(location);
            assert!(table.total_slots <= MAX_LOCATION_SLOTS);
            for fixed in table.fixed {
                assert!(fixed.slot_index < table.total_slots, "{location}: {}", fixed.name);
                assert!(!fixed.kind.is_configuration_dependent());
            }
        }
    }

    #[test]
    fn test_head_cockpit_position() {
        let head = layout(Location::Head);
        let cockpit = head
            .fixed
            .iter()
            .find(|f| f.kind == SystemComponentKind::Cockpit)
            .unwrap();
        assert_eq!(cockpit.slot_index, 2);
        assert_eq!(head.fixed.len(), 5);
    }
}
