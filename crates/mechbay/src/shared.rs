//! Thread-safe handle for hosts that edit from one thread and read from
//! others.
//!
//! Writers serialize on a mutex around the controller. After each committed
//! change, and before any subscriber runs, the new unit is published as an
//! immutable snapshot; readers clone the `Arc` under a short read lock and
//! never wait on a writer's operation.
//!
//! Subscribers run after the writer lock is released, so a callback may call
//! [`SharedUnitState::read`] or [`SharedUnitState::write`] on the same handle.

use mechbay_criticals::{CriticalsResult, UnitManager};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::config::ControllerConfig;
use crate::state::UnitStateController;

/// A [`UnitStateController`] behind one writer lock, plus a snapshot.
#[derive(Debug)]
pub struct SharedUnitState {
    controller: Mutex<UnitStateController>,
    snapshot: Arc<RwLock<Arc<UnitManager>>>,
}

impl SharedUnitState {
    /// Creates the controller and publishes its first snapshot.
    ///
    /// # Errors
    ///
    /// Same as [`UnitStateController::new`].
    pub fn new(config: ControllerConfig) -> CriticalsResult<Self> {
        let mut controller = UnitStateController::new(config)?;
        let snapshot = Arc::new(RwLock::new(Arc::new(controller.current_unit().clone())));

        controller.defer_notifications();
        let target = Arc::clone(&snapshot);
        controller.set_publisher(Box::new(move |unit: &UnitManager| {
            *target.write() = Arc::new(unit.clone());
        }));

        Ok(Self {
            controller: Mutex::new(controller),
            snapshot,
        })
    }

    /// The most recently committed unit.
    #[must_use]
    pub fn snapshot(&self) -> Arc<UnitManager> {
        Arc::clone(&self.snapshot.read())
    }

    /// Runs `f` with exclusive access to the controller, then notifies
    /// subscribers of every change committed meanwhile.
    ///
    /// Notifications are delivered with the lock released. Changes committed
    /// by other writers during delivery are picked up by the same loop.
    pub fn write<R>(&self, f: impl FnOnce(&mut UnitStateController) -> R) -> R {
        let (result, mut pending) = {
            let mut controller = self.controller.lock();
            let result = f(&mut controller);
            (result, controller.take_notifications())
        };
        while let Some(mut batch) = pending {
            batch.deliver();
            let mut controller = self.controller.lock();
            controller.return_notifications(batch);
            pending = controller.take_notifications();
        }
        result
    }

    /// Runs `f` with the controller locked for reading history or reports.
    pub fn read<R>(&self, f: impl FnOnce(&UnitStateController) -> R) -> R {
        let controller = self.controller.lock();
        f(&controller)
    }
}
