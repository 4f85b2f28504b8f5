//! # Unit State Controller
//!
//! Owns the one live [`UnitManager`] of an editing session.
//!
//! Every successful mutation appends a [`ChangeEvent`] to a bounded log,
//! publishes it on the change feed, and then calls each subscriber with no
//! payload. Subscribers re-read state through the query surface. A panicking
//! subscriber is logged and skipped; the rest still run.
//!
//! Behind [`crate::SharedUnitState`] notifications are deferred: commits only
//! count pending rounds, and the shared handle delivers them once the writer
//! lock is released, so callbacks may lock the handle again.
//!
//! Engine and gyro changes go through the [`Reconstructor`]: the new unit is
//! built on the side and swapped in only once it is complete. A failed or
//! no-op change leaves the live unit, the log and the subscribers alone.

use mechbay_criticals::{
    ChangePreview, CriticalsResult, EquipmentAllocation, EquipmentBucket, GroupId,
    Placement, ReconstructionReport, Reconstructor, SpecialComponentChange, UnitManager,
    UnitSummary, ValidationResult,
};
use mechbay_shared::{
    ArmorType, EngineType, EquipmentDefinition, GyroType, Location, StructureType,
    UnitConfiguration,
};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::time::SystemTime;
use tracing::{debug, error, info};

use crate::config::ControllerConfig;
use crate::events::{Change, ChangeEvent, ChangeFeed, ChangeReceiver};

/// Callback run after every successful mutation.
pub type SubscriberFn = Box<dyn FnMut() + Send>;

/// Called with the new unit before subscribers run.
pub(crate) type PublishFn = Box<dyn Fn(&UnitManager) + Send>;

/// Subscribers lent out for delivery outside the controller.
pub(crate) struct PendingNotifications {
    rounds: usize,
    subscribers: Vec<(Subscription, SubscriberFn)>,
}

impl PendingNotifications {
    /// Calls every subscriber once per pending round.
    pub(crate) fn deliver(&mut self) {
        for _ in 0..self.rounds {
            notify_all(&mut self.subscribers);
        }
    }
}

/// Token returned by [`UnitStateController::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping the subscription token makes the callback impossible to remove"]
pub struct Subscription(u64);

/// Owned snapshot of a unit for hosts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitReport {
    /// Current configuration.
    pub configuration: UnitConfiguration,
    /// Slot and equipment counts.
    pub summary: UnitSummary,
    /// Validation result.
    pub validation: ValidationResult,
    /// Pooled equipment.
    pub unallocated: Vec<EquipmentAllocation>,
    /// All equipment by location, pool last.
    pub equipment_by_location: BTreeMap<EquipmentBucket, Vec<EquipmentAllocation>>,
}

/// The single writer for one unit.
pub struct UnitStateController {
    unit: UnitManager,
    config: ControllerConfig,
    reconstructor: Reconstructor,
    history: VecDeque<ChangeEvent>,
    next_sequence: u64,
    subscribers: Vec<(Subscription, SubscriberFn)>,
    next_subscription: u64,
    deferred: bool,
    pending_rounds: usize,
    in_flight: Vec<Subscription>,
    cancelled: Vec<Subscription>,
    feed: ChangeFeed,
    publisher: Option<PublishFn>,
}

impl std::fmt::Debug for UnitStateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitStateController")
            .field("unit", &self.unit)
            .field("history_len", &self.history.len())
            .field("subscribers", &self.subscriber_count())
            .field("pending_rounds", &self.pending_rounds)
            .finish_non_exhaustive()
    }
}

impl UnitStateController {
    /// Creates a controller with the unit described by `config.unit`.
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::InvalidCombination` if the configured engine
    /// and gyro do not fit.
    pub fn new(config: ControllerConfig) -> CriticalsResult<Self> {
        let unit = UnitManager::with_special_components(config.unit.clone())?;
        let mut controller = Self {
            unit,
            reconstructor: Reconstructor::new(config.reconstruction),
            history: VecDeque::with_capacity(config.history_limit),
            next_sequence: 0,
            subscribers: Vec::new(),
            next_subscription: 0,
            deferred: false,
            pending_rounds: 0,
            in_flight: Vec::new(),
            cancelled: Vec::new(),
            feed: ChangeFeed::new(config.feed_capacity),
            publisher: None,
            config,
        };
        let configuration = controller.unit.configuration().clone();
        controller.record(Change::Initialized { configuration });
        Ok(controller)
    }

    /// Controller with default settings and a Standard/Standard 50-ton unit.
    ///
    /// # Errors
    ///
    /// Same as [`UnitStateController::new`].
    pub fn with_defaults() -> CriticalsResult<Self> {
        Self::new(ControllerConfig::default())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The live unit.
    #[inline]
    #[must_use]
    pub const fn current_unit(&self) -> &UnitManager {
        &self.unit
    }

    /// Settings in use.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current configuration.
    #[must_use]
    pub const fn configuration(&self) -> &UnitConfiguration {
        self.unit.configuration()
    }

    /// Current engine.
    #[must_use]
    pub const fn engine_type(&self) -> EngineType {
        self.unit.engine_type()
    }

    /// Current gyro.
    #[must_use]
    pub const fn gyro_type(&self) -> GyroType {
        self.unit.gyro_type()
    }

    /// Validation of the live unit.
    #[must_use]
    pub fn validation(&self) -> ValidationResult {
        self.unit.validate()
    }

    /// Change log, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &ChangeEvent> {
        self.history.iter()
    }

    /// The last `count` log entries, oldest first.
    #[must_use]
    pub fn recent_changes(&self, count: usize) -> Vec<&ChangeEvent> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).collect()
    }

    /// Owned report of the live unit.
    #[must_use]
    pub fn report(&self) -> UnitReport {
        UnitReport {
            configuration: self.unit.configuration().clone(),
            summary: self.unit.summary(),
            validation: self.unit.validate(),
            unallocated: self.unit.unallocated().to_vec(),
            equipment_by_location: self
                .unit
                .equipment_by_location()
                .into_iter()
                .map(|(bucket, items)| (bucket, items.into_iter().cloned().collect()))
                .collect(),
        }
    }

    /// What switching to `engine`/`gyro` would do. Nothing changes.
    #[must_use]
    pub fn preview_change(&self, engine: EngineType, gyro: GyroType) -> ChangePreview {
        Reconstructor::preview(&self.unit, engine, gyro)
    }

    /// A receiver on the change feed.
    #[must_use]
    pub fn feed(&self) -> ChangeReceiver {
        self.feed.receiver()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len() + self.in_flight.len() - self.cancelled.len()
    }

    // =========================================================================
    // Subscribers
    // =========================================================================

    /// Registers a callback run after every successful mutation.
    pub fn subscribe(&mut self, callback: impl FnMut() + Send + 'static) -> Subscription {
        let token = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((token, Box::new(callback)));
        token
    }

    /// Removes a callback. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(token, _)| *token != subscription);
        if self.subscribers.len() != before {
            return true;
        }
        // Lent out for delivery; dropped when handed back.
        if self.in_flight.contains(&subscription) && !self.cancelled.contains(&subscription) {
            self.cancelled.push(subscription);
            return true;
        }
        false
    }

    /// Commits stop calling subscribers and count pending rounds instead.
    pub(crate) fn defer_notifications(&mut self) {
        self.deferred = true;
    }

    /// Lends out the subscribers if rounds are pending and no other
    /// delivery is in progress. Hand them back with
    /// [`UnitStateController::return_notifications`].
    pub(crate) fn take_notifications(&mut self) -> Option<PendingNotifications> {
        if self.pending_rounds == 0 || !self.in_flight.is_empty() {
            return None;
        }
        let subscribers = std::mem::take(&mut self.subscribers);
        self.in_flight = subscribers.iter().map(|(token, _)| *token).collect();
        Some(PendingNotifications {
            rounds: std::mem::take(&mut self.pending_rounds),
            subscribers,
        })
    }

    /// Takes lent subscribers back, ahead of any registered meanwhile.
    pub(crate) fn return_notifications(&mut self, pending: PendingNotifications) {
        let cancelled = std::mem::take(&mut self.cancelled);
        let mut subscribers: Vec<_> = pending
            .subscribers
            .into_iter()
            .filter(|(token, _)| !cancelled.contains(token))
            .collect();
        subscribers.append(&mut self.subscribers);
        self.subscribers = subscribers;
        self.in_flight.clear();
    }

    pub(crate) fn set_publisher(&mut self, publisher: PublishFn) {
        publisher(&self.unit);
        self.publisher = Some(publisher);
    }

    // =========================================================================
    // System components
    // =========================================================================

    /// Switches the engine; see [`UnitStateController::change_engine_and_gyro`].
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::InvalidCombination` if the new engine does not
    /// fit with the current gyro.
    pub fn change_engine(&mut self, engine: EngineType) -> CriticalsResult<ReconstructionReport> {
        self.change_engine_and_gyro(engine, self.gyro_type())
    }

    /// Switches the gyro; see [`UnitStateController::change_engine_and_gyro`].
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::InvalidCombination` if the new gyro does not
    /// fit with the current engine.
    pub fn change_gyro(&mut self, gyro: GyroType) -> CriticalsResult<ReconstructionReport> {
        self.change_engine_and_gyro(self.engine_type(), gyro)
    }

    /// Rebuilds the unit for a new engine and gyro and migrates equipment.
    /// Returns an empty report, without logging or notifying, when neither
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::InvalidCombination` if the pair does not fit.
    /// The live unit is kept.
    pub fn change_engine_and_gyro(
        &mut self,
        engine: EngineType,
        gyro: GyroType,
    ) -> CriticalsResult<ReconstructionReport> {
        let old_engine = self.engine_type();
        let old_gyro = self.gyro_type();
        if engine == old_engine && gyro == old_gyro {
            debug!(engine = %engine, gyro = %gyro, "component change is a no-op");
            return Ok(ReconstructionReport::default());
        }

        let configuration = self
            .unit
            .configuration()
            .clone()
            .with_engine(engine)
            .with_gyro(gyro);
        let rebuilt = self.reconstructor.reconstruct(&self.unit, configuration)?;
        self.unit = rebuilt.unit;

        info!(
            old_engine = %old_engine,
            old_gyro = %old_gyro,
            new_engine = %engine,
            new_gyro = %gyro,
            "system components changed"
        );
        self.commit(Change::ComponentsChanged {
            old_engine,
            old_gyro,
            new_engine: engine,
            new_gyro: gyro,
            summary: rebuilt.report.summary,
        });
        Ok(rebuilt.report)
    }

    /// Swaps the structure type.
    pub fn change_structure(&mut self, structure: StructureType) -> SpecialComponentChange {
        let change = self.unit.change_structure(structure);
        if !change.is_empty() {
            self.commit(Change::StructureChanged {
                structure,
                removed: change.removed.len(),
                added: change.added.len(),
            });
        }
        change
    }

    /// Swaps the armor type.
    pub fn change_armor(&mut self, armor: ArmorType) -> SpecialComponentChange {
        let change = self.unit.change_armor(armor);
        if !change.is_empty() {
            self.commit(Change::ArmorChanged {
                armor,
                removed: change.removed.len(),
                added: change.added.len(),
            });
        }
        change
    }

    // =========================================================================
    // Equipment
    // =========================================================================

    /// Places a new instance of `definition`. Without `start` the lowest
    /// fitting run is used.
    ///
    /// # Errors
    ///
    /// Any placement error from [`UnitManager::place`]; nothing changes.
    pub fn add_equipment(
        &mut self,
        definition: &EquipmentDefinition,
        location: Location,
        start: Option<usize>,
    ) -> CriticalsResult<GroupId> {
        let group_id = self.unit.place(definition, location, start).map_err(|err| {
            debug!(equipment = %definition.name, location = %location, error = %err, "placement rejected");
            err
        })?;
        let placement = self.placement_of(group_id, location);
        self.commit(Change::EquipmentAdded {
            group_id,
            name: definition.name.clone(),
            placement,
        });
        Ok(group_id)
    }

    /// Moves placed equipment to the pool.
    ///
    /// # Errors
    ///
    /// `CriticalsError::NotPlaced` or `CriticalsError::GroupNotFound`.
    pub fn remove_equipment(&mut self, group_id: GroupId) -> CriticalsResult<()> {
        self.unit.displace(group_id)?;
        self.commit(Change::EquipmentRemoved { group_id });
        Ok(())
    }

    /// Adds a new instance of `definition` to the pool.
    pub fn add_to_pool(&mut self, definition: EquipmentDefinition) -> GroupId {
        let name = definition.name.clone();
        let group_id = self.unit.add_definition_to_pool(definition);
        self.commit(Change::EquipmentPooled { group_id, name });
        group_id
    }

    /// Places pooled equipment.
    ///
    /// # Errors
    ///
    /// Any error from [`UnitManager::allocate_from_pool`]; the item stays
    /// pooled.
    pub fn allocate_from_pool(
        &mut self,
        group_id: GroupId,
        location: Location,
        start: usize,
    ) -> CriticalsResult<()> {
        self.unit.allocate_from_pool(group_id, location, start)?;
        self.commit(Change::EquipmentAllocated {
            group_id,
            placement: Placement::new(location, start),
        });
        Ok(())
    }

    /// Moves placed equipment, possibly to another location.
    ///
    /// # Errors
    ///
    /// Any error from [`UnitManager::relocate`]; the item stays put.
    pub fn move_equipment(
        &mut self,
        group_id: GroupId,
        location: Location,
        start: usize,
    ) -> CriticalsResult<()> {
        self.unit.relocate(group_id, location, start)?;
        self.commit(Change::EquipmentMoved {
            group_id,
            placement: Placement::new(location, start),
        });
        Ok(())
    }

    /// Removes equipment from the unit and returns it.
    ///
    /// # Errors
    ///
    /// `CriticalsError::GroupNotFound` if it is not on the unit.
    pub fn delete_equipment(&mut self, group_id: GroupId) -> CriticalsResult<EquipmentAllocation> {
        let removed = self.unit.delete(group_id)?;
        self.commit(Change::EquipmentDeleted {
            group_id,
            name: removed.name().to_string(),
        });
        Ok(removed)
    }

    /// Discards the live unit and builds a fresh one from `configuration`, or
    /// from the configured startup unit when `None`.
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::InvalidCombination` if the engine and gyro do
    /// not fit. The live unit is kept.
    pub fn reset(&mut self, configuration: Option<UnitConfiguration>) -> CriticalsResult<()> {
        let configuration = configuration.unwrap_or_else(|| self.config.unit.clone());
        self.unit = UnitManager::with_special_components(configuration.clone())?;
        info!(engine = %configuration.engine_type, gyro = %configuration.gyro_type, "unit reset");
        self.commit(Change::Reset { configuration });
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn placement_of(&self, group_id: GroupId, location: Location) -> Placement {
        self.unit
            .find_equipment(group_id)
            .and_then(EquipmentAllocation::placement)
            .unwrap_or(Placement::new(location, 0))
    }

    /// Appends to the log and feed without notifying.
    fn record(&mut self, change: Change) {
        let event = ChangeEvent {
            sequence: self.next_sequence,
            timestamp: SystemTime::now(),
            change,
        };
        self.next_sequence += 1;

        while self.history.len() >= self.config.history_limit.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(event.clone());
        self.feed.publish(event);
    }

    /// Records, publishes the snapshot, then notifies.
    fn commit(&mut self, change: Change) {
        self.record(change);
        if let Some(publisher) = &self.publisher {
            publisher(&self.unit);
        }
        if self.deferred {
            self.pending_rounds += 1;
        } else {
            notify_all(&mut self.subscribers);
        }
    }
}

/// Calls each subscriber in isolation; a panic is logged and the rest run.
fn notify_all(subscribers: &mut [(Subscription, SubscriberFn)]) {
    for (token, callback) in subscribers {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(subscription = token.0, panic = %message, "subscriber panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechbay_criticals::CriticalsError;
    use mechbay_shared::EquipmentCategory;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn laser() -> EquipmentDefinition {
        EquipmentDefinition::new("ml", "Medium Laser", 1, EquipmentCategory::Weapon).unwrap()
    }

    fn counter(controller: &mut UnitStateController) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let _ = controller.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        calls
    }

    #[test]
    fn test_new_logs_initialization() {
        let controller = UnitStateController::with_defaults().unwrap();
        assert_eq!(controller.history().len(), 1);
        assert!(matches!(
            controller.history().next().unwrap().change,
            Change::Initialized { .. }
        ));
        assert!(controller.validation().is_valid());
    }

    #[test]
    fn test_add_equipment_notifies_on_success_only() {
        let mut controller = UnitStateController::with_defaults().unwrap();
        let calls = counter(&mut controller);

        let id = controller
            .add_equipment(&laser(), Location::LeftArm, None)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            controller.current_unit().find_equipment(id).unwrap().start_index(),
            Some(4)
        );

        let err = controller
            .add_equipment(&laser(), Location::LeftArm, Some(0))
            .unwrap_err();
        assert!(matches!(err, CriticalsError::SlotOccupied { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.history().len(), 2);
    }

    #[test]
    fn test_change_structure_pools_pieces() {
        let mut controller = UnitStateController::with_defaults().unwrap();
        let calls = counter(&mut controller);

        let change = controller.change_structure(StructureType::EndoSteel);
        assert_eq!(change.added.len(), 14);
        assert_eq!(controller.current_unit().unallocated_count(), 14);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let again = controller.change_structure(StructureType::EndoSteel);
        assert!(again.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_recent_changes_returns_tail() {
        let mut controller = UnitStateController::with_defaults().unwrap();
        for _ in 0..3 {
            controller.add_to_pool(laser());
        }
        let recent = controller.recent_changes(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].sequence, 2);
        assert_eq!(recent[1].sequence, 3);
        assert_eq!(controller.recent_changes(10).len(), 4);
    }

    #[test]
    fn test_unsubscribe() {
        let mut controller = UnitStateController::with_defaults().unwrap();
        let token = controller.subscribe(|| {});
        assert_eq!(controller.subscriber_count(), 1);
        assert!(controller.unsubscribe(token));
        assert!(!controller.unsubscribe(token));
        assert_eq!(controller.subscriber_count(), 0);
    }
}
