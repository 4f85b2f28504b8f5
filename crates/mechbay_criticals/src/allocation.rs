//! # Equipment Allocations
//!
//! One concrete instance of an equipment definition, identified by a group
//! id. An allocation is either placed (location plus a contiguous run of
//! slot indices) or unplaced (in the unallocated pool, no slots).

use mechbay_shared::{EquipmentCategory, EquipmentDefinition, Location};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier shared by every slot an allocation occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Uuid);

impl GroupId {
    /// Mints a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Where a placed allocation sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Location.
    pub location: Location,
    /// First occupied slot, 0-based.
    pub start: usize,
}

impl Placement {
    /// Creates a placement.
    #[inline]
    #[must_use]
    pub const fn new(location: Location, start: usize) -> Self {
        Self { location, start }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} slot {}", self.location.abbreviation(), self.start + 1)
    }
}

/// A concrete placement instance of an [`EquipmentDefinition`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentAllocation {
    group_id: GroupId,
    definition: EquipmentDefinition,
    location: Option<Location>,
    slots: Vec<usize>,
}

impl EquipmentAllocation {
    /// Creates an unplaced allocation with a fresh group id.
    #[must_use]
    pub fn unplaced(definition: EquipmentDefinition) -> Self {
        Self::with_group(GroupId::new(), definition)
    }

    /// Creates an unplaced allocation with the given group id.
    #[must_use]
    pub fn with_group(group_id: GroupId, definition: EquipmentDefinition) -> Self {
        Self {
            group_id,
            definition,
            location: None,
            slots: Vec::new(),
        }
    }

    /// Group id.
    #[inline]
    #[must_use]
    pub const fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Definition this allocation instantiates.
    #[inline]
    #[must_use]
    pub const fn definition(&self) -> &EquipmentDefinition {
        &self.definition
    }

    /// Display name of the equipment.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Contiguous slots required.
    #[inline]
    #[must_use]
    pub const fn required_slots(&self) -> usize {
        self.definition.required_slots
    }

    /// Equipment category.
    #[inline]
    #[must_use]
    pub const fn category(&self) -> EquipmentCategory {
        self.definition.category
    }

    /// Location, or `None` while in the pool.
    #[inline]
    #[must_use]
    pub const fn location(&self) -> Option<Location> {
        self.location
    }

    /// Occupied slot indices in ascending order; empty while in the pool.
    #[inline]
    #[must_use]
    pub fn occupied_slots(&self) -> &[usize] {
        &self.slots
    }

    /// First occupied slot.
    #[inline]
    #[must_use]
    pub fn start_index(&self) -> Option<usize> {
        self.slots.first().copied()
    }

    /// Last occupied slot.
    #[inline]
    #[must_use]
    pub fn end_index(&self) -> Option<usize> {
        self.slots.last().copied()
    }

    /// Location and start slot, if placed.
    #[must_use]
    pub fn placement(&self) -> Option<Placement> {
        Some(Placement::new(self.location?, self.start_index()?))
    }

    /// Returns true if the allocation occupies slots.
    #[inline]
    #[must_use]
    pub fn is_placed(&self) -> bool {
        self.location.is_some()
    }

    /// Returns true if `index` is one of the occupied slots.
    #[inline]
    #[must_use]
    pub fn occupies(&self, index: usize) -> bool {
        self.slots.binary_search(&index).is_ok()
    }

    pub(crate) fn place(&mut self, location: Location, start: usize) {
        self.location = Some(location);
        self.slots = (start..start + self.definition.required_slots).collect();
    }

    /// Drops any placement data. The pool never holds stale slots.
    pub(crate) fn clear_placement(&mut self) {
        self.location = None;
        self.slots.clear();
    }
}

impl fmt::Display for EquipmentAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.placement() {
            Some(placement) => write!(f, "{} @ {placement}", self.definition.name),
            None => write!(f, "{} (unallocated)", self.definition.name),
        }
    }
}
