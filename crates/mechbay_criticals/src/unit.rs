//! # Unit Manager
//!
//! Every section of one chassis plus the unallocated pool.
//!
//! Construction order is fixed: sections with their chassis components
//! first, then engine and gyro reservations, and only then equipment.
//! Engine and gyro are never changed on a live unit; the reconstructor
//! builds a new one instead.
//!
//! Every mutating call either succeeds completely or returns an error with
//! the unit unchanged. No call drops an equipment instance: removal paths
//! re-register it in a section, push it to the pool, or hand it back to the
//! caller.

use mechbay_shared::{
    ArmorType, EngineType, EquipmentDefinition, GyroType, Location, SpecialComponent,
    StructureType, UnitConfiguration,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

use crate::allocation::{EquipmentAllocation, GroupId, Placement};
use crate::error::{CriticalsError, CriticalsResult};
use crate::rules::{self, SystemLayout, ValidationResult};
use crate::section::Section;

/// Grouping key for [`UnitManager::equipment_by_location`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EquipmentBucket {
    /// Placed in a location.
    Location(Location),
    /// In the unallocated pool.
    Unallocated,
}

impl fmt::Display for EquipmentBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Location(location) => fmt::Display::fmt(location, f),
            Self::Unallocated => f.write_str("Unallocated"),
        }
    }
}

/// Slot and equipment counts for a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    /// Number of sections.
    pub sections: usize,
    /// Slots across all sections.
    pub total_slots: usize,
    /// Slots held by equipment.
    pub occupied_slots: usize,
    /// Empty slots.
    pub available_slots: usize,
    /// Slots held by system components.
    pub system_slots: usize,
    /// Placed equipment instances.
    pub allocated_equipment: usize,
    /// Pooled equipment instances.
    pub unallocated_equipment: usize,
}

impl UnitSummary {
    /// Placed plus pooled.
    #[inline]
    #[must_use]
    pub const fn total_equipment(&self) -> usize {
        self.allocated_equipment + self.unallocated_equipment
    }
}

/// Result of swapping a special structure or armor type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpecialComponentChange {
    /// Pieces of the old type taken off the unit.
    pub removed: Vec<EquipmentAllocation>,
    /// Pool entries created for the new type.
    pub added: Vec<GroupId>,
}

impl SpecialComponentChange {
    /// Returns true if nothing was removed or added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// All sections of one chassis plus its unallocated pool.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitManager {
    configuration: UnitConfiguration,
    sections: Vec<Section>,
    pool: Vec<EquipmentAllocation>,
}

impl UnitManager {
    /// Builds an empty unit with engine and gyro slots reserved.
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::InvalidCombination` if the engine and gyro do
    /// not fit the chassis.
    pub fn new(configuration: UnitConfiguration) -> CriticalsResult<Self> {
        let engine = configuration.engine_type;
        let gyro = configuration.gyro_type;

        let validation = rules::validate_combination(engine, gyro);
        if !validation.is_valid() {
            return Err(CriticalsError::InvalidCombination {
                errors: validation.errors,
            });
        }

        let mut sections: Vec<Section> = Location::ALL.into_iter().map(Section::new).collect();
        for (location, kind, slots) in SystemLayout::new(engine, gyro).reservations() {
            sections[location.index()].reserve_system(kind, slots)?;
        }

        debug!(engine = %engine, gyro = %gyro, "unit constructed");
        Ok(Self {
            configuration,
            sections,
            pool: Vec::new(),
        })
    }

    /// Builds the unit and pools the pieces of any special structure or
    /// armor in the configuration.
    ///
    /// # Errors
    ///
    /// Same as [`UnitManager::new`].
    pub fn with_special_components(configuration: UnitConfiguration) -> CriticalsResult<Self> {
        let mut unit = Self::new(configuration)?;
        let structure = unit.configuration.structure_type;
        let armor = unit.configuration.armor_type;
        unit.pool_structure_pieces(structure);
        unit.pool_armor_pieces(armor);
        Ok(unit)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current configuration.
    #[inline]
    #[must_use]
    pub const fn configuration(&self) -> &UnitConfiguration {
        &self.configuration
    }

    /// Engine type.
    #[inline]
    #[must_use]
    pub const fn engine_type(&self) -> EngineType {
        self.configuration.engine_type
    }

    /// Gyro type.
    #[inline]
    #[must_use]
    pub const fn gyro_type(&self) -> GyroType {
        self.configuration.gyro_type
    }

    /// Section for `location`.
    #[inline]
    #[must_use]
    pub fn section(&self, location: Location) -> &Section {
        &self.sections[location.index()]
    }

    /// Every section, in [`Location::ALL`] order.
    #[inline]
    #[must_use]
    pub fn all_sections(&self) -> &[Section] {
        &self.sections
    }

    /// Pooled equipment, in insertion order.
    #[inline]
    #[must_use]
    pub fn unallocated(&self) -> &[EquipmentAllocation] {
        &self.pool
    }

    /// Every allocation: placed ones by location and start slot, then the
    /// pool.
    #[must_use]
    pub fn all_equipment(&self) -> Vec<&EquipmentAllocation> {
        self.sections
            .iter()
            .flat_map(Section::all_equipment)
            .chain(self.pool.iter())
            .collect()
    }

    /// Every allocation grouped by definition id.
    #[must_use]
    pub fn equipment_groups(&self) -> BTreeMap<&str, Vec<&EquipmentAllocation>> {
        let mut groups: BTreeMap<&str, Vec<&EquipmentAllocation>> = BTreeMap::new();
        for alloc in self.all_equipment() {
            groups.entry(alloc.definition().id.as_str()).or_default().push(alloc);
        }
        groups
    }

    /// Every allocation keyed by location, with an `Unallocated` bucket.
    /// All buckets are present, empty or not.
    #[must_use]
    pub fn equipment_by_location(&self) -> BTreeMap<EquipmentBucket, Vec<&EquipmentAllocation>> {
        let mut buckets: BTreeMap<_, _> = self
            .sections
            .iter()
            .map(|section| (EquipmentBucket::Location(section.location()), section.all_equipment()))
            .collect();
        buckets.insert(EquipmentBucket::Unallocated, self.pool.iter().collect());
        buckets
    }

    /// Allocation with `group_id`, placed or pooled.
    #[must_use]
    pub fn find_equipment(&self, group_id: GroupId) -> Option<&EquipmentAllocation> {
        self.sections
            .iter()
            .find_map(|section| section.equipment(group_id))
            .or_else(|| self.pool.iter().find(|alloc| alloc.group_id() == group_id))
    }

    /// Where `group_id` currently lives.
    #[must_use]
    pub fn locate(&self, group_id: GroupId) -> Option<EquipmentBucket> {
        if let Some(section) = self
            .sections
            .iter()
            .find(|section| section.equipment(group_id).is_some())
        {
            return Some(EquipmentBucket::Location(section.location()));
        }
        self.pool
            .iter()
            .any(|alloc| alloc.group_id() == group_id)
            .then_some(EquipmentBucket::Unallocated)
    }

    /// Placed equipment instances.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.sections.iter().map(Section::equipment_count).sum()
    }

    /// Pooled equipment instances.
    #[inline]
    #[must_use]
    pub fn unallocated_count(&self) -> usize {
        self.pool.len()
    }

    /// Slot and equipment counts.
    #[must_use]
    pub fn summary(&self) -> UnitSummary {
        let mut summary = UnitSummary {
            sections: self.sections.len(),
            unallocated_equipment: self.pool.len(),
            ..UnitSummary::default()
        };
        for section in &self.sections {
            summary.total_slots += section.total_slots();
            summary.occupied_slots += section.occupied_slot_count();
            summary.available_slots += section.available_slot_count();
            summary.system_slots += section.system_slot_count();
            summary.allocated_equipment += section.equipment_count();
        }
        summary
    }

    /// Component combination check plus every section's consistency check,
    /// group id uniqueness, and engine/gyro reservations matching the rules.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let engine = self.engine_type();
        let gyro = self.gyro_type();
        let mut result = rules::validate_combination(engine, gyro);

        for section in &self.sections {
            result.errors.extend(section.validate());
        }

        let mut seen = HashSet::new();
        for alloc in self.all_equipment() {
            if !seen.insert(alloc.group_id()) {
                result
                    .errors
                    .push(format!("{}: group {} appears twice", alloc.name(), alloc.group_id()));
            }
        }

        for alloc in &self.pool {
            if alloc.is_placed() {
                result
                    .errors
                    .push(format!("{}: pooled but still records a placement", alloc.name()));
            }
        }

        let layout = SystemLayout::new(engine, gyro);
        for (location, kind, slots) in layout.reservations() {
            if self.section(location).reserved_for(kind) != slots {
                result.errors.push(format!(
                    "{location}: {kind} reservation does not match {engine}/{gyro}"
                ));
            }
        }

        result
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Places a new instance of `definition`, resolving the start slot with
    /// [`Section::find_contiguous`] when `start` is `None`.
    ///
    /// # Errors
    ///
    /// * `CriticalsError::InsufficientSpace` when no start is given and no
    ///   run is long enough.
    /// * Any error from [`Section::allocate`].
    pub fn place(
        &mut self,
        definition: &EquipmentDefinition,
        location: Location,
        start: Option<usize>,
    ) -> CriticalsResult<GroupId> {
        let section = &mut self.sections[location.index()];
        let start = match start {
            Some(start) => start,
            None => section
                .find_contiguous(definition.required_slots)
                .ok_or_else(|| CriticalsError::InsufficientSpace {
                    location,
                    required: definition.required_slots,
                    largest: section.max_contiguous_run(),
                })?,
        };

        let group_id = GroupId::new();
        section.allocate(definition, start, group_id)?;
        Ok(group_id)
    }

    /// Adds allocations to the pool, stripping any placement data. Items
    /// whose group id is already on the unit are skipped. Returns how many
    /// were added.
    pub fn add_to_pool(&mut self, items: impl IntoIterator<Item = EquipmentAllocation>) -> usize {
        let mut added = 0;
        for mut item in items {
            if self.locate(item.group_id()).is_some() {
                warn!(group = %item.group_id(), equipment = %item.name(), "group already on unit, not pooled");
                continue;
            }
            item.clear_placement();
            self.pool.push(item);
            added += 1;
        }
        added
    }

    /// Pools a new instance of `definition`.
    pub fn add_definition_to_pool(&mut self, definition: EquipmentDefinition) -> GroupId {
        let item = EquipmentAllocation::unplaced(definition);
        let group_id = item.group_id();
        self.pool.push(item);
        group_id
    }

    /// Takes `group_id` out of the pool.
    pub fn remove_from_pool(&mut self, group_id: GroupId) -> Option<EquipmentAllocation> {
        let index = self.pool.iter().position(|alloc| alloc.group_id() == group_id)?;
        Some(self.pool.remove(index))
    }

    /// Moves placed equipment to the pool.
    ///
    /// # Errors
    ///
    /// * `CriticalsError::NotPlaced` if it is already pooled.
    /// * `CriticalsError::GroupNotFound` if it is not on the unit.
    pub fn displace(&mut self, group_id: GroupId) -> CriticalsResult<()> {
        let Some(mut alloc) = self
            .sections
            .iter_mut()
            .find_map(|section| section.remove(group_id))
        else {
            return Err(self.missing(group_id));
        };

        debug!(equipment = %alloc.name(), from = ?alloc.placement(), "equipment displaced to pool");
        alloc.clear_placement();
        self.pool.push(alloc);
        Ok(())
    }

    /// Places pooled equipment at `location`/`start`. On failure the item
    /// stays in the pool at the same position.
    ///
    /// # Errors
    ///
    /// * `CriticalsError::AlreadyPlaced` if the group is placed.
    /// * `CriticalsError::GroupNotFound` if it is not on the unit.
    /// * Any error from [`Section::allocate`].
    pub fn allocate_from_pool(
        &mut self,
        group_id: GroupId,
        location: Location,
        start: usize,
    ) -> CriticalsResult<()> {
        let Some(index) = self.pool.iter().position(|alloc| alloc.group_id() == group_id) else {
            return Err(match self.locate(group_id) {
                Some(_) => CriticalsError::AlreadyPlaced(group_id),
                None => CriticalsError::GroupNotFound(group_id),
            });
        };

        self.sections[location.index()].allocate(self.pool[index].definition(), start, group_id)?;
        self.pool.remove(index);
        Ok(())
    }

    /// Moves placed equipment to `location`/`start`, possibly across
    /// sections. On failure it is back where it started.
    ///
    /// # Errors
    ///
    /// * `CriticalsError::NotPlaced` / `CriticalsError::GroupNotFound`.
    /// * `CriticalsError::SlotOutOfRange` / `CriticalsError::SlotOccupied`
    ///   if the target run cannot hold it.
    pub fn relocate(
        &mut self,
        group_id: GroupId,
        location: Location,
        start: usize,
    ) -> CriticalsResult<()> {
        let Some(Placement {
            location: from,
            start: old_start,
        }) = self.find_equipment(group_id).and_then(EquipmentAllocation::placement)
        else {
            return Err(self.missing(group_id));
        };

        if from == location {
            return self.sections[location.index()].move_within(group_id, start);
        }

        let required = self
            .find_equipment(group_id)
            .map_or(0, EquipmentAllocation::required_slots);
        self.sections[location.index()].check_range(start, required, None)?;

        let Some(alloc) = self.sections[from.index()].remove(group_id) else {
            return Err(CriticalsError::GroupNotFound(group_id));
        };
        if let Err(err) = self.sections[location.index()].allocate(alloc.definition(), start, group_id) {
            if self.sections[from.index()]
                .allocate(alloc.definition(), old_start, group_id)
                .is_err()
            {
                self.add_to_pool([alloc]);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Removes equipment from the unit entirely and returns it. The only
    /// operation that reduces the equipment count.
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::GroupNotFound` if it is not on the unit.
    pub fn delete(&mut self, group_id: GroupId) -> CriticalsResult<EquipmentAllocation> {
        if let Some(alloc) = self
            .sections
            .iter_mut()
            .find_map(|section| section.remove(group_id))
        {
            return Ok(alloc);
        }
        self.remove_from_pool(group_id)
            .ok_or(CriticalsError::GroupNotFound(group_id))
    }

    // =========================================================================
    // Special structure and armor
    // =========================================================================

    /// Swaps the structure type: removes every piece of the old type, placed
    /// or pooled, and pools the pieces of the new one.
    pub fn change_structure(&mut self, structure: StructureType) -> SpecialComponentChange {
        if structure == self.configuration.structure_type {
            return SpecialComponentChange::default();
        }
        let removed = self.remove_special(|special| matches!(special, SpecialComponent::Structure(_)));
        self.configuration.structure_type = structure;
        let added = self.pool_structure_pieces(structure);
        info!(structure = structure.name(), removed = removed.len(), added = added.len(), "structure changed");
        SpecialComponentChange { removed, added }
    }

    /// Swaps the armor type; see [`UnitManager::change_structure`].
    pub fn change_armor(&mut self, armor: ArmorType) -> SpecialComponentChange {
        if armor == self.configuration.armor_type {
            return SpecialComponentChange::default();
        }
        let removed = self.remove_special(|special| matches!(special, SpecialComponent::Armor(_)));
        self.configuration.armor_type = armor;
        let added = self.pool_armor_pieces(armor);
        info!(armor = armor.name(), removed = removed.len(), added = added.len(), "armor changed");
        SpecialComponentChange { removed, added }
    }

    fn pool_structure_pieces(&mut self, structure: StructureType) -> Vec<GroupId> {
        (1..=structure.critical_pieces())
            .map(|index| self.add_definition_to_pool(EquipmentDefinition::structure_piece(structure, index)))
            .collect()
    }

    fn pool_armor_pieces(&mut self, armor: ArmorType) -> Vec<GroupId> {
        (1..=armor.critical_pieces())
            .map(|index| self.add_definition_to_pool(EquipmentDefinition::armor_piece(armor, index)))
            .collect()
    }

    fn remove_special(&mut self, predicate: impl Fn(SpecialComponent) -> bool) -> Vec<EquipmentAllocation> {
        let doomed: Vec<GroupId> = self
            .all_equipment()
            .into_iter()
            .filter(|alloc| alloc.definition().special.is_some_and(&predicate))
            .map(EquipmentAllocation::group_id)
            .collect();
        doomed
            .into_iter()
            .filter_map(|group_id| self.delete(group_id).ok())
            .collect()
    }

    /// Error for a group that is not placed in any section.
    fn missing(&self, group_id: GroupId) -> CriticalsError {
        if self.pool.iter().any(|alloc| alloc.group_id() == group_id) {
            CriticalsError::NotPlaced(group_id)
        } else {
            CriticalsError::GroupNotFound(group_id)
        }
    }
}
