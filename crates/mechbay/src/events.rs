//! # Change Events
//!
//! Structured change log entries and the bounded feed they are published on.
//!
//! ```text
//! ┌──────────────┐  try_send  ┌──────────────┐  drain  ┌──────────────┐
//! │  Controller  │───────────>│  Change Feed │<────────│     Host     │
//! └──────────────┘            └──────────────┘         └──────────────┘
//! ```
//!
//! Sends never block. When the host falls behind, the oldest undelivered
//! event is evicted so the feed always ends with the latest change; the
//! change log stays the source of truth.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use mechbay_criticals::{GroupId, Placement, ReconstructionSummary};
use mechbay_shared::{ArmorType, EngineType, GyroType, StructureType, UnitConfiguration};
use serde::Serialize;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Coarse classification of a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The whole unit was replaced.
    UnitUpdated,
    /// Engine, gyro, structure or armor changed.
    SystemChange,
    /// Equipment was added, moved or removed.
    EquipmentChange,
}

/// What changed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Change {
    // =========================================================================
    // Unit
    // =========================================================================
    /// Controller created.
    Initialized {
        /// Starting configuration.
        configuration: UnitConfiguration,
    },

    /// Unit discarded and rebuilt.
    Reset {
        /// New configuration.
        configuration: UnitConfiguration,
    },

    // =========================================================================
    // System components
    // =========================================================================
    /// Engine and/or gyro changed through a rebuild.
    ComponentsChanged {
        /// Engine before.
        old_engine: EngineType,
        /// Gyro before.
        old_gyro: GyroType,
        /// Engine after.
        new_engine: EngineType,
        /// Gyro after.
        new_gyro: GyroType,
        /// Migration counts.
        summary: ReconstructionSummary,
    },

    /// Structure type swapped.
    StructureChanged {
        /// New structure.
        structure: StructureType,
        /// Pieces removed.
        removed: usize,
        /// Pieces pooled.
        added: usize,
    },

    /// Armor type swapped.
    ArmorChanged {
        /// New armor.
        armor: ArmorType,
        /// Pieces removed.
        removed: usize,
        /// Pieces pooled.
        added: usize,
    },

    // =========================================================================
    // Equipment
    // =========================================================================
    /// New equipment placed.
    EquipmentAdded {
        /// New group.
        group_id: GroupId,
        /// Equipment name.
        name: String,
        /// Where it went.
        placement: Placement,
    },

    /// New equipment pooled.
    EquipmentPooled {
        /// New group.
        group_id: GroupId,
        /// Equipment name.
        name: String,
    },

    /// Placed equipment moved to the pool.
    EquipmentRemoved {
        /// Group moved.
        group_id: GroupId,
    },

    /// Pooled equipment placed.
    EquipmentAllocated {
        /// Group placed.
        group_id: GroupId,
        /// Where it went.
        placement: Placement,
    },

    /// Placed equipment moved.
    EquipmentMoved {
        /// Group moved.
        group_id: GroupId,
        /// Where it went.
        placement: Placement,
    },

    /// Equipment taken off the unit for good.
    EquipmentDeleted {
        /// Group removed.
        group_id: GroupId,
        /// Equipment name.
        name: String,
    },
}

impl Change {
    /// Classification of this change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::Initialized { .. } | Self::Reset { .. } => ChangeKind::UnitUpdated,
            Self::ComponentsChanged { .. }
            | Self::StructureChanged { .. }
            | Self::ArmorChanged { .. } => ChangeKind::SystemChange,
            Self::EquipmentAdded { .. }
            | Self::EquipmentPooled { .. }
            | Self::EquipmentRemoved { .. }
            | Self::EquipmentAllocated { .. }
            | Self::EquipmentMoved { .. }
            | Self::EquipmentDeleted { .. } => ChangeKind::EquipmentChange,
        }
    }
}

/// One change log entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChangeEvent {
    /// Position in the controller's lifetime, starting at 0.
    pub sequence: u64,
    /// Wall-clock time of the change.
    pub timestamp: SystemTime,
    /// What changed.
    pub change: Change,
}

impl ChangeEvent {
    /// Classification of this entry.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.change.kind()
    }
}

/// Producer side of the change feed.
#[derive(Debug)]
pub(crate) struct ChangeFeed {
    sender: Sender<ChangeEvent>,
    receiver: Receiver<ChangeEvent>,
}

impl ChangeFeed {
    /// Creates a feed holding at most `capacity` undelivered events.
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Publishes without blocking. A full feed loses its oldest event to
    /// make room. Returns the number of events evicted.
    pub(crate) fn publish(&self, event: ChangeEvent) -> usize {
        let mut pending = event;
        let mut evicted = 0;
        loop {
            match self.sender.try_send(pending) {
                Ok(()) => {
                    if evicted > 0 {
                        debug!(evicted, "change feed full, oldest events evicted");
                    }
                    return evicted;
                }
                Err(TrySendError::Full(event)) => {
                    if self.receiver.try_recv().is_ok() {
                        evicted += 1;
                    }
                    pending = event;
                }
                Err(TrySendError::Disconnected(event)) => {
                    warn!(sequence = event.sequence, "change feed disconnected, event dropped");
                    return evicted;
                }
            }
        }
    }

    /// A new consumer handle.
    pub(crate) fn receiver(&self) -> ChangeReceiver {
        ChangeReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Consumer side of the change feed. Clones share one queue.
#[derive(Clone, Debug)]
pub struct ChangeReceiver {
    receiver: Receiver<ChangeEvent>,
}

impl ChangeReceiver {
    /// Takes every pending event.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.receiver.try_iter().collect()
    }

    /// Takes one event, if any.
    #[inline]
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns true if events are pending.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}
