//! # Critical Slots
//!
//! A slot is one addressable unit of space in a location. Its content is a
//! sum type: empty, reserved for a system component, or one cell of an
//! equipment run.

use mechbay_shared::{Location, SystemComponentKind};
use serde::{Deserialize, Serialize};

use crate::allocation::{EquipmentAllocation, GroupId};
use crate::error::{CriticalsError, CriticalsResult};

/// Name shown for an empty slot.
pub const EMPTY_SLOT_NAME: &str = "-Empty-";

/// What a slot holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotContent {
    /// Nothing.
    #[default]
    Empty,
    /// A system component (fixed or configuration-dependent).
    System {
        /// Component kind.
        kind: SystemComponentKind,
        /// Display name.
        name: String,
    },
    /// One cell of a contiguous equipment run.
    Equipment {
        /// Owning allocation.
        group_id: GroupId,
        /// Equipment display name.
        name: String,
        /// First slot of the run.
        start: usize,
        /// Length of the run.
        len: usize,
    },
}

/// One critical slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    location: Location,
    index: usize,
    content: SlotContent,
}

impl Slot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new(location: Location, index: usize) -> Self {
        Self {
            location,
            index,
            content: SlotContent::Empty,
        }
    }

    /// Creates a slot already held by a system component.
    pub(crate) fn with_system(
        location: Location,
        index: usize,
        kind: SystemComponentKind,
        name: &str,
    ) -> Self {
        Self {
            location,
            index,
            content: SlotContent::System {
                kind,
                name: name.to_string(),
            },
        }
    }

    /// Location this slot belongs to.
    #[inline]
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// 0-based index within the location.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Current content.
    #[inline]
    #[must_use]
    pub const fn content(&self) -> &SlotContent {
        &self.content
    }

    /// Returns true if the slot holds nothing.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.content, SlotContent::Empty)
    }

    /// Returns true if a system component holds the slot.
    #[inline]
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self.content, SlotContent::System { .. })
    }

    /// Returns true if equipment holds the slot.
    #[inline]
    #[must_use]
    pub const fn has_equipment(&self) -> bool {
        matches!(self.content, SlotContent::Equipment { .. })
    }

    /// Group id of the equipment in this slot.
    #[must_use]
    pub fn equipment_group(&self) -> Option<GroupId> {
        match self.content {
            SlotContent::Equipment { group_id, .. } => Some(group_id),
            _ => None,
        }
    }

    /// System kind reserving this slot.
    #[must_use]
    pub fn system_kind(&self) -> Option<SystemComponentKind> {
        match self.content {
            SlotContent::System { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Name shown on the record sheet.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match &self.content {
            SlotContent::Empty => EMPTY_SLOT_NAME,
            SlotContent::System { name, .. } | SlotContent::Equipment { name, .. } => name,
        }
    }

    /// Marks the slot as held by a system component.
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::SlotOccupied` unless the slot is empty.
    pub fn reserve_for_system(
        &mut self,
        kind: SystemComponentKind,
        name: impl Into<String>,
    ) -> CriticalsResult<()> {
        self.ensure_empty()?;
        self.content = SlotContent::System {
            kind,
            name: name.into(),
        };
        Ok(())
    }

    /// Marks the slot as one cell of `allocation`.
    ///
    /// # Errors
    ///
    /// * `CriticalsError::SlotOccupied` unless the slot is empty.
    /// * `CriticalsError::AllocationMismatch` if the allocation is not placed
    ///   over this slot.
    pub fn allocate_equipment(&mut self, allocation: &EquipmentAllocation) -> CriticalsResult<()> {
        self.ensure_empty()?;

        let group_id = allocation.group_id();
        let start = match allocation.start_index() {
            Some(start)
                if allocation.location() == Some(self.location)
                    && allocation.occupies(self.index) =>
            {
                start
            }
            _ => {
                return Err(CriticalsError::AllocationMismatch {
                    group_id,
                    location: self.location,
                    index: self.index,
                })
            }
        };

        self.content = SlotContent::Equipment {
            group_id,
            name: allocation.name().to_string(),
            start,
            len: allocation.required_slots(),
        };
        Ok(())
    }

    /// Empties the slot, returning the equipment group that held it.
    pub fn clear(&mut self) -> Option<GroupId> {
        let group = self.equipment_group();
        self.content = SlotContent::Empty;
        group
    }

    /// Structural self-check. Returns one message per problem found.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match &self.content {
            SlotContent::Empty => {}
            SlotContent::System { name, .. } => {
                if name.is_empty() {
                    errors.push(format!("{}: system slot has no name", self.label()));
                }
            }
            SlotContent::Equipment {
                group_id,
                start,
                len,
                ..
            } => {
                if *len == 0 {
                    errors.push(format!("{}: equipment {group_id} has zero length", self.label()));
                } else if self.index < *start || self.index >= start + len {
                    errors.push(format!(
                        "{}: equipment {group_id} spans {}..{}, which excludes this slot",
                        self.label(),
                        start + 1,
                        start + len
                    ));
                }
            }
        }
        errors
    }

    /// Short label such as `LT slot 3` (1-based).
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} slot {}", self.location.abbreviation(), self.index + 1)
    }

    fn ensure_empty(&self) -> CriticalsResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CriticalsError::SlotOccupied {
                location: self.location,
                index: self.index,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechbay_shared::{EquipmentCategory, EquipmentDefinition};

    fn medium_laser_at(location: Location, start: usize) -> EquipmentAllocation {
        let def = EquipmentDefinition::new("ml", "Medium Laser", 1, EquipmentCategory::Weapon).unwrap();
        let mut alloc = EquipmentAllocation::unplaced(def);
        alloc.place(location, start);
        alloc
    }

    #[test]
    fn test_new_slot_is_empty() {
        let slot = Slot::new(Location::LeftArm, 4);
        assert!(slot.is_empty());
        assert!(!slot.is_system());
        assert!(!slot.has_equipment());
        assert_eq!(slot.display_name(), EMPTY_SLOT_NAME);
        assert_eq!(slot.label(), "LA slot 5");
    }

    #[test]
    fn test_reserve_for_system() {
        let mut slot = Slot::new(Location::CenterTorso, 0);
        slot.reserve_for_system(SystemComponentKind::Engine, "Engine").unwrap();
        assert!(slot.is_system());
        assert_eq!(slot.system_kind(), Some(SystemComponentKind::Engine));
        assert_eq!(slot.display_name(), "Engine");

        let again = slot.reserve_for_system(SystemComponentKind::Gyro, "Gyro");
        assert!(matches!(again, Err(CriticalsError::SlotOccupied { index: 0, .. })));
    }

    #[test]
    fn test_allocate_and_clear() {
        let alloc = medium_laser_at(Location::RightTorso, 3);
        let mut slot = Slot::new(Location::RightTorso, 3);
        slot.allocate_equipment(&alloc).unwrap();
        assert_eq!(slot.equipment_group(), Some(alloc.group_id()));
        assert_eq!(slot.display_name(), "Medium Laser");
        assert!(slot.validate().is_empty());

        assert_eq!(slot.clear(), Some(alloc.group_id()));
        assert!(slot.is_empty());
        assert_eq!(slot.clear(), None);
    }

    #[test]
    fn test_allocate_rejects_foreign_slot() {
        let alloc = medium_laser_at(Location::RightTorso, 3);
        let mut wrong_index = Slot::new(Location::RightTorso, 4);
        assert!(matches!(
            wrong_index.allocate_equipment(&alloc),
            Err(CriticalsError::AllocationMismatch { index: 4, .. })
        ));
        assert!(wrong_index.is_empty());

        let mut wrong_location = Slot::new(Location::LeftTorso, 3);
        assert!(wrong_location.allocate_equipment(&alloc).is_err());
    }

    #[test]
    fn test_allocate_into_system_slot_fails() {
        let alloc = medium_laser_at(Location::Head, 2);
        let mut slot = Slot::new(Location::Head, 2);
        slot.reserve_for_system(SystemComponentKind::Cockpit, "Standard Cockpit").unwrap();
        assert!(matches!(
            slot.allocate_equipment(&alloc),
            Err(CriticalsError::SlotOccupied { .. })
        ));
        assert_eq!(slot.display_name(), "Standard Cockpit");
    }

    #[test]
    fn test_validate_detects_span_mismatch() {
        let mut slot = Slot::new(Location::LeftLeg, 5);
        slot.content = SlotContent::Equipment {
            group_id: GroupId::new(),
            name: "Jump Jet".to_string(),
            start: 0,
            len: 2,
        };
        assert_eq!(slot.validate().len(), 1);
    }
}
