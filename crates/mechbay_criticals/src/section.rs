//! # Sections
//!
//! One chassis location: a fixed-length slot array, its permanently fixed
//! system components, the system reservations made for the current engine
//! and gyro, and a registry from group id to the allocation occupying a run
//! of slots.
//!
//! Every mutation checks first and writes second, so a failed call leaves
//! the section untouched.

use mechbay_shared::{
    layout, EquipmentDefinition, FixedComponent, Location, LocationLayout, SystemComponentKind,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::allocation::{EquipmentAllocation, GroupId};
use crate::error::{CriticalsError, CriticalsResult};
use crate::slot::Slot;

/// One location of the chassis.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    location: Location,
    layout: LocationLayout,
    slots: Vec<Slot>,
    registry: HashMap<GroupId, EquipmentAllocation>,
    reservations: BTreeMap<SystemComponentKind, Vec<usize>>,
}

impl Section {
    /// Creates the section with its fixed components in place.
    #[must_use]
    pub fn new(location: Location) -> Self {
        let layout = layout(location);
        let slots = (0..layout.total_slots)
            .map(|index| {
                layout
                    .fixed
                    .iter()
                    .find(|fixed| fixed.slot_index == index)
                    .map_or_else(
                        || Slot::new(location, index),
                        |fixed| Slot::with_system(location, index, fixed.kind, fixed.name),
                    )
            })
            .collect();

        Self {
            location,
            layout,
            slots,
            registry: HashMap::new(),
            reservations: BTreeMap::new(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Location of this section.
    #[inline]
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    /// Static chassis layout for this location.
    #[inline]
    #[must_use]
    pub const fn configuration(&self) -> &LocationLayout {
        &self.layout
    }

    /// Permanently fixed components.
    #[inline]
    #[must_use]
    pub fn fixed_components(&self) -> &'static [FixedComponent] {
        self.layout.fixed
    }

    /// Slot at `index`.
    #[inline]
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Every slot, in index order.
    #[inline]
    #[must_use]
    pub fn all_slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Indices of empty slots.
    #[must_use]
    pub fn available_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|slot| slot.is_empty())
            .map(Slot::index)
            .collect()
    }

    /// Lowest start index of a run of at least `count` empty slots.
    #[must_use]
    pub fn find_contiguous(&self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }

        let mut run_start = 0;
        let mut run_len = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.is_empty() {
                if run_len == 0 {
                    run_start = index;
                }
                run_len += 1;
                if run_len >= count {
                    return Some(run_start);
                }
            } else {
                run_len = 0;
            }
        }
        None
    }

    /// Returns true if some run of `count` empty slots exists.
    #[inline]
    #[must_use]
    pub fn can_fit(&self, count: usize) -> bool {
        self.find_contiguous(count).is_some()
    }

    /// Longest run of empty slots.
    #[must_use]
    pub fn max_contiguous_run(&self) -> usize {
        let mut best = 0;
        let mut run = 0;
        for slot in &self.slots {
            if slot.is_empty() {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
        }
        best
    }

    /// Returns true if `count` slots starting at `start` are all empty.
    #[must_use]
    pub fn can_place(&self, count: usize, start: usize) -> bool {
        count > 0 && self.check_range(start, count, None).is_ok()
    }

    /// Allocation registered under `group_id`.
    #[inline]
    #[must_use]
    pub fn equipment(&self, group_id: GroupId) -> Option<&EquipmentAllocation> {
        self.registry.get(&group_id)
    }

    /// Allocation occupying slot `index`.
    #[must_use]
    pub fn equipment_at(&self, index: usize) -> Option<&EquipmentAllocation> {
        let group_id = self.slots.get(index)?.equipment_group()?;
        self.registry.get(&group_id)
    }

    /// Every allocation in this section, ordered by start index.
    #[must_use]
    pub fn all_equipment(&self) -> Vec<&EquipmentAllocation> {
        let mut all: Vec<_> = self.registry.values().collect();
        all.sort_by_key(|alloc| alloc.start_index());
        all
    }

    /// Number of allocations in this section.
    #[inline]
    #[must_use]
    pub fn equipment_count(&self) -> usize {
        self.registry.len()
    }

    /// Groups whose slots intersect `indices`, ordered by start index.
    #[must_use]
    pub fn find_conflicting(&self, indices: &[usize]) -> Vec<GroupId> {
        let mut found: Vec<GroupId> = Vec::new();
        for &index in indices {
            if let Some(group_id) = self.slots.get(index).and_then(Slot::equipment_group) {
                if !found.contains(&group_id) {
                    found.push(group_id);
                }
            }
        }
        found.sort_by_key(|id| self.registry.get(id).and_then(EquipmentAllocation::start_index));
        found
    }

    /// Slots reserved for `kind` by [`Section::reserve_system`].
    #[must_use]
    pub fn reserved_for(&self, kind: SystemComponentKind) -> &[usize] {
        self.reservations
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Slots held by equipment.
    #[must_use]
    pub fn occupied_slot_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.has_equipment()).count()
    }

    /// Slots held by system components, fixed or reserved.
    #[must_use]
    pub fn system_slot_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_system()).count()
    }

    /// Empty slots.
    #[must_use]
    pub fn available_slot_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_empty()).count()
    }

    /// Returns true if `group_id` may be moved to start at `new_start`.
    #[must_use]
    pub fn can_move(&self, group_id: GroupId, new_start: usize) -> bool {
        self.registry.get(&group_id).is_some_and(|alloc| {
            self.check_range(new_start, alloc.required_slots(), Some(group_id))
                .is_ok()
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Places `definition` over `required_slots` slots from `start`.
    ///
    /// # Errors
    ///
    /// * `CriticalsError::AlreadyPlaced` if the group is already registered.
    /// * `CriticalsError::InvalidDefinition` for a zero-slot definition.
    /// * `CriticalsError::SlotOutOfRange` if the run passes the last slot.
    /// * `CriticalsError::SlotOccupied` if any slot in the run is not empty.
    pub fn allocate(
        &mut self,
        definition: &EquipmentDefinition,
        start: usize,
        group_id: GroupId,
    ) -> CriticalsResult<()> {
        if self.registry.contains_key(&group_id) {
            return Err(CriticalsError::AlreadyPlaced(group_id));
        }
        if definition.required_slots == 0 {
            return Err(CriticalsError::InvalidDefinition(format!(
                "{} requires zero slots",
                definition.id
            )));
        }
        self.check_range(start, definition.required_slots, None)?;

        let mut allocation = EquipmentAllocation::with_group(group_id, definition.clone());
        allocation.place(self.location, start);
        self.write_run(&allocation)?;

        debug!(
            location = %self.location,
            equipment = %definition.name,
            start,
            slots = definition.required_slots,
            "equipment allocated"
        );
        self.registry.insert(group_id, allocation);
        Ok(())
    }

    /// Clears every slot of `group_id` and drops it from the registry.
    pub fn remove(&mut self, group_id: GroupId) -> Option<EquipmentAllocation> {
        let allocation = self.registry.remove(&group_id)?;
        self.clear_run(allocation.occupied_slots());
        debug!(location = %self.location, equipment = %allocation.name(), "equipment removed");
        Some(allocation)
    }

    /// Reserves `indices` for a system component.
    ///
    /// Equipment overlapping the indices is removed first and returned as
    /// displaced; only then are the slots marked as reserved.
    ///
    /// # Errors
    ///
    /// * `CriticalsError::SlotOutOfRange` if an index is past the last slot.
    /// * `CriticalsError::SystemSlotConflict` if an index is fixed chassis
    ///   space or reserved for another kind.
    ///
    /// Nothing is displaced when an error is returned.
    pub fn reserve_system(
        &mut self,
        kind: SystemComponentKind,
        indices: &[usize],
    ) -> CriticalsResult<Vec<EquipmentAllocation>> {
        let already = self.reserved_for(kind).to_vec();
        for &index in indices {
            let slot = self.slots.get(index).ok_or(CriticalsError::SlotOutOfRange {
                location: self.location,
                index,
                total: self.slots.len(),
            })?;
            if slot.is_system() && !already.contains(&index) {
                return Err(CriticalsError::SystemSlotConflict {
                    location: self.location,
                    index,
                    existing: slot.display_name().to_string(),
                });
            }
        }

        let displaced: Vec<EquipmentAllocation> = self
            .find_conflicting(indices)
            .into_iter()
            .filter_map(|group_id| self.remove(group_id))
            .collect();

        let mut reserved = already;
        for &index in indices {
            if reserved.contains(&index) {
                continue;
            }
            if let Some(slot) = self.slots.get_mut(index) {
                slot.reserve_for_system(kind, kind.name())?;
            }
            reserved.push(index);
        }
        reserved.sort_unstable();
        self.reservations.insert(kind, reserved);

        if !displaced.is_empty() {
            warn!(
                location = %self.location,
                kind = %kind,
                displaced = displaced.len(),
                "system reservation displaced equipment"
            );
        }
        Ok(displaced)
    }

    /// Clears every slot reserved for `kind`, returning the freed indices.
    pub fn release_system(&mut self, kind: SystemComponentKind) -> Vec<usize> {
        let released = self.reservations.remove(&kind).unwrap_or_default();
        for &index in &released {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.clear();
            }
        }
        released
    }

    /// Moves `group_id` to start at `new_start` within this section.
    ///
    /// Target slots must be empty or already owned by the same group.
    ///
    /// # Errors
    ///
    /// * `CriticalsError::GroupNotFound` if the group is not in this section.
    /// * `CriticalsError::SlotOutOfRange` / `CriticalsError::SlotOccupied`
    ///   if the target run cannot hold it. The item stays where it was.
    pub fn move_within(&mut self, group_id: GroupId, new_start: usize) -> CriticalsResult<()> {
        let (len, old_start) = match self.registry.get(&group_id) {
            Some(alloc) => (alloc.required_slots(), alloc.start_index()),
            None => return Err(CriticalsError::GroupNotFound(group_id)),
        };
        if old_start == Some(new_start) {
            return Ok(());
        }
        self.check_range(new_start, len, Some(group_id))?;

        let Some(mut allocation) = self.registry.remove(&group_id) else {
            return Err(CriticalsError::GroupNotFound(group_id));
        };
        self.clear_run(allocation.occupied_slots());
        allocation.place(self.location, new_start);

        if let Err(err) = self.write_run(&allocation) {
            if let Some(start) = old_start {
                allocation.place(self.location, start);
                self.write_run(&allocation)?;
            }
            self.registry.insert(group_id, allocation);
            return Err(err);
        }

        debug!(location = %self.location, equipment = %allocation.name(), new_start, "equipment moved");
        self.registry.insert(group_id, allocation);
        Ok(())
    }

    // =========================================================================
    // Consistency
    // =========================================================================

    /// Runs every slot self-check plus the registry cross-check.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = self.slots.iter().flat_map(Slot::validate).collect();

        for (group_id, allocation) in &self.registry {
            let name = allocation.name();
            if allocation.group_id() != *group_id {
                errors.push(format!("{}: {name} registered under {group_id}", self.location));
            }
            if allocation.location() != Some(self.location) {
                errors.push(format!("{}: {name} records a different location", self.location));
            }
            let occupied = allocation.occupied_slots();
            if occupied.len() != allocation.required_slots()
                || occupied.windows(2).any(|pair| pair[1] != pair[0] + 1)
            {
                errors.push(format!("{}: {name} does not occupy a contiguous run", self.location));
            }
            for &index in occupied {
                match self.slots.get(index) {
                    Some(slot) if slot.equipment_group() == Some(*group_id) => {}
                    Some(slot) => errors.push(format!(
                        "{}: does not point back to {name}",
                        slot.label()
                    )),
                    None => errors.push(format!(
                        "{}: {name} occupies missing slot {}",
                        self.location,
                        index + 1
                    )),
                }
            }
        }

        for slot in &self.slots {
            if let Some(group_id) = slot.equipment_group() {
                let owned = self
                    .registry
                    .get(&group_id)
                    .is_some_and(|alloc| alloc.occupies(slot.index()));
                if !owned {
                    errors.push(format!("{}: orphaned equipment {group_id}", slot.label()));
                }
            }
        }

        for (kind, indices) in &self.reservations {
            for &index in indices {
                if self.slots.get(index).and_then(Slot::system_kind) != Some(*kind) {
                    errors.push(format!(
                        "{} slot {}: reserved for {kind} but not marked",
                        self.location.abbreviation(),
                        index + 1
                    ));
                }
            }
        }

        for fixed in self.layout.fixed {
            if self.slots.get(fixed.slot_index).and_then(Slot::system_kind) != Some(fixed.kind) {
                errors.push(format!(
                    "{} slot {}: missing fixed {}",
                    self.location.abbreviation(),
                    fixed.slot_index + 1,
                    fixed.name
                ));
            }
        }

        errors
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Checks that `len` slots from `start` exist and are empty, or held by
    /// `owner` when given.
    pub(crate) fn check_range(
        &self,
        start: usize,
        len: usize,
        owner: Option<GroupId>,
    ) -> CriticalsResult<()> {
        let total = self.slots.len();
        let end = start.saturating_add(len);
        if end > total {
            return Err(CriticalsError::SlotOutOfRange {
                location: self.location,
                index: start.max(total),
                total,
            });
        }

        for slot in &self.slots[start..end] {
            let usable = slot.is_empty() || (owner.is_some() && slot.equipment_group() == owner);
            if !usable {
                return Err(CriticalsError::SlotOccupied {
                    location: self.location,
                    index: slot.index(),
                });
            }
        }
        Ok(())
    }

    /// Writes `allocation` into its slots; all or nothing.
    fn write_run(&mut self, allocation: &EquipmentAllocation) -> CriticalsResult<()> {
        let indices = allocation.occupied_slots();
        for (written, &index) in indices.iter().enumerate() {
            let result = match self.slots.get_mut(index) {
                Some(slot) => slot.allocate_equipment(allocation),
                None => Err(CriticalsError::SlotOutOfRange {
                    location: self.location,
                    index,
                    total: self.slots.len(),
                }),
            };
            if let Err(err) = result {
                self.clear_run(&indices[..written]);
                return Err(err);
            }
        }
        Ok(())
    }

    fn clear_run(&mut self, indices: &[usize]) {
        for &index in indices {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechbay_shared::EquipmentCategory;

    fn def(id: &str, slots: usize) -> EquipmentDefinition {
        EquipmentDefinition::new(id, id.to_uppercase(), slots, EquipmentCategory::Weapon).unwrap()
    }

    #[test]
    fn test_new_arm_has_actuators() {
        let arm = Section::new(Location::LeftArm);
        assert_eq!(arm.total_slots(), 12);
        assert_eq!(arm.system_slot_count(), 4);
        assert_eq!(arm.available_slots(), (4..12).collect::<Vec<_>>());
        assert_eq!(arm.slot(0).unwrap().display_name(), "Shoulder");
        assert!(arm.validate().is_empty());
    }

    #[test]
    fn test_find_contiguous_prefers_lowest_start() {
        let mut ct = Section::new(Location::CenterTorso);
        ct.reserve_system(SystemComponentKind::Engine, &[0, 1, 4, 8, 9, 10, 11])
            .unwrap();
        assert_eq!(ct.available_slots(), vec![2, 3, 5, 6, 7]);
        assert_eq!(ct.find_contiguous(2), Some(2));
        assert_eq!(ct.find_contiguous(3), Some(5));
        assert_eq!(ct.find_contiguous(4), None);
        assert_eq!(ct.max_contiguous_run(), 3);
        assert!(ct.can_fit(3));
        assert!(!ct.can_fit(4));
    }

    #[test]
    fn test_allocate_and_remove() {
        let mut lt = Section::new(Location::LeftTorso);
        let id = GroupId::new();
        lt.allocate(&def("ac10", 7), 0, id).unwrap();

        assert_eq!(lt.occupied_slot_count(), 7);
        assert_eq!(lt.equipment_at(6).unwrap().group_id(), id);
        assert!(lt.equipment_at(7).is_none());
        assert!(lt.validate().is_empty());

        let removed = lt.remove(id).unwrap();
        assert_eq!(removed.occupied_slots(), &[0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(lt.available_slot_count(), 12);
        assert!(lt.remove(id).is_none());
    }

    #[test]
    fn test_failed_allocate_has_no_side_effects() {
        let mut ra = Section::new(Location::RightArm);
        let before = ra.clone();

        // Overlaps the hand actuator.
        let err = ra.allocate(&def("ppc", 3), 2, GroupId::new()).unwrap_err();
        assert!(matches!(err, CriticalsError::SlotOccupied { index: 2, .. }));
        // Runs off the end.
        let err = ra.allocate(&def("ppc", 3), 10, GroupId::new()).unwrap_err();
        assert!(matches!(err, CriticalsError::SlotOutOfRange { .. }));

        assert_eq!(ra, before);
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let mut rt = Section::new(Location::RightTorso);
        let id = GroupId::new();
        rt.allocate(&def("ml", 1), 0, id).unwrap();
        assert_eq!(
            rt.allocate(&def("ml", 1), 5, id),
            Err(CriticalsError::AlreadyPlaced(id))
        );
    }

    #[test]
    fn test_reserve_system_displaces_overlapping_equipment() {
        let mut lt = Section::new(Location::LeftTorso);
        let ac10 = GroupId::new();
        let srm = GroupId::new();
        lt.allocate(&def("ac10", 7), 0, ac10).unwrap();
        lt.allocate(&def("srm", 2), 9, srm).unwrap();

        let displaced = lt.reserve_system(SystemComponentKind::Engine, &[0, 1, 2]).unwrap();
        assert_eq!(displaced.len(), 1);
        assert_eq!(displaced[0].group_id(), ac10);
        assert_eq!(lt.reserved_for(SystemComponentKind::Engine), &[0, 1, 2]);
        assert_eq!(lt.available_slots(), vec![3, 4, 5, 6, 7, 8, 11]);
        assert!(lt.equipment(srm).is_some());
        assert!(lt.validate().is_empty());
    }

    #[test]
    fn test_reserve_system_conflicts_are_atomic() {
        let mut head = Section::new(Location::Head);
        let id = GroupId::new();
        head.allocate(&def("c3", 1), 3, id).unwrap();
        let before = head.clone();

        let err = head
            .reserve_system(SystemComponentKind::Engine, &[3, 4])
            .unwrap_err();
        assert!(matches!(err, CriticalsError::SystemSlotConflict { index: 4, .. }));
        assert_eq!(head, before);

        let err = head.reserve_system(SystemComponentKind::Gyro, &[6]).unwrap_err();
        assert!(matches!(err, CriticalsError::SlotOutOfRange { index: 6, .. }));
    }

    #[test]
    fn test_reserve_same_kind_is_idempotent() {
        let mut ct = Section::new(Location::CenterTorso);
        ct.reserve_system(SystemComponentKind::Engine, &[0, 1, 2]).unwrap();
        ct.reserve_system(SystemComponentKind::Engine, &[2, 3]).unwrap();
        assert_eq!(ct.reserved_for(SystemComponentKind::Engine), &[0, 1, 2, 3]);

        let err = ct.reserve_system(SystemComponentKind::Gyro, &[3]).unwrap_err();
        assert!(matches!(err, CriticalsError::SystemSlotConflict { .. }));
    }

    #[test]
    fn test_release_system() {
        let mut ct = Section::new(Location::CenterTorso);
        ct.reserve_system(SystemComponentKind::Gyro, &[3, 4, 5, 6]).unwrap();
        assert_eq!(ct.release_system(SystemComponentKind::Gyro), vec![3, 4, 5, 6]);
        assert_eq!(ct.available_slot_count(), 12);
        assert!(ct.release_system(SystemComponentKind::Gyro).is_empty());
    }

    #[test]
    fn test_move_within_overlapping_self() {
        let mut la = Section::new(Location::LeftArm);
        let id = GroupId::new();
        la.allocate(&def("lrm", 3), 4, id).unwrap();

        assert!(la.can_move(id, 5));
        la.move_within(id, 5).unwrap();
        assert_eq!(la.equipment(id).unwrap().occupied_slots(), &[5, 6, 7]);
        assert!(la.slot(4).unwrap().is_empty());
        assert!(la.validate().is_empty());
    }

    #[test]
    fn test_move_within_failure_restores() {
        let mut la = Section::new(Location::LeftArm);
        let lrm = GroupId::new();
        let ml = GroupId::new();
        la.allocate(&def("lrm", 3), 4, lrm).unwrap();
        la.allocate(&def("ml", 1), 9, ml).unwrap();
        let before = la.clone();

        assert!(!la.can_move(lrm, 8));
        assert!(matches!(
            la.move_within(lrm, 8),
            Err(CriticalsError::SlotOccupied { index: 9, .. })
        ));
        assert!(la.move_within(lrm, 10).is_err());
        assert_eq!(la, before);

        let unknown = GroupId::new();
        assert_eq!(
            la.move_within(unknown, 0),
            Err(CriticalsError::GroupNotFound(unknown))
        );
    }

    #[test]
    fn test_find_conflicting_orders_by_start() {
        let mut rt = Section::new(Location::RightTorso);
        let a = GroupId::new();
        let b = GroupId::new();
        rt.allocate(&def("a", 2), 6, a).unwrap();
        rt.allocate(&def("b", 2), 1, b).unwrap();
        assert_eq!(rt.find_conflicting(&[7, 2, 1, 6]), vec![b, a]);
        assert!(rt.find_conflicting(&[0, 11]).is_empty());
    }
}
