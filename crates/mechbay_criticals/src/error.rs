//! # Criticals Error Types
//!
//! All errors that can occur while placing, moving or reserving critical
//! slots. Placement failures are expected outcomes and are always returned
//! as values; none of them leave partial state behind.

use mechbay_shared::{Location, SharedError};
use thiserror::Error;

use crate::allocation::GroupId;

/// Errors that can occur in the criticals core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriticalsError {
    /// Slot index is past the end of the location.
    #[error("slot {index} is out of range for {location} ({total} slots)")]
    SlotOutOfRange {
        /// Location addressed.
        location: Location,
        /// Offending 0-based index.
        index: usize,
        /// Slot count of the location.
        total: usize,
    },

    /// Slot already holds a system component or other equipment.
    #[error("{location} slot {index} is already occupied")]
    SlotOccupied {
        /// Location addressed.
        location: Location,
        /// Occupied 0-based index.
        index: usize,
    },

    /// No contiguous run is long enough.
    #[error("{location} has no run of {required} free slots (largest is {largest})")]
    InsufficientSpace {
        /// Location addressed.
        location: Location,
        /// Slots required.
        required: usize,
        /// Largest contiguous free run available.
        largest: usize,
    },

    /// Equipment definition is unusable.
    #[error("invalid equipment definition: {0}")]
    InvalidDefinition(String),

    /// No allocation with this group id exists on the unit.
    #[error("equipment group not found: {0}")]
    GroupNotFound(GroupId),

    /// The group exists but sits in the unallocated pool.
    #[error("equipment group {0} is not placed")]
    NotPlaced(GroupId),

    /// The group is already placed.
    #[error("equipment group {0} is already placed")]
    AlreadyPlaced(GroupId),

    /// A slot the equipment slot refers to does not belong to it.
    #[error("{location} slot {index} does not belong to equipment group {group_id}")]
    AllocationMismatch {
        /// Group that was expected.
        group_id: GroupId,
        /// Location addressed.
        location: Location,
        /// Slot index.
        index: usize,
    },

    /// System reservation collides with a fixed or differently-owned slot.
    #[error("{location} slot {index} is already reserved for {existing}")]
    SystemSlotConflict {
        /// Location addressed.
        location: Location,
        /// Slot index.
        index: usize,
        /// Name of the component already holding the slot.
        existing: String,
    },

    /// Engine/gyro combination does not fit the chassis.
    #[error("invalid system configuration: {}", errors.join("; "))]
    InvalidCombination {
        /// Validation messages.
        errors: Vec<String>,
    },

    /// Location name not recognised.
    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// Invalid options file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<SharedError> for CriticalsError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::UnknownLocation(name) => Self::UnknownLocation(name),
            SharedError::ZeroSlots(_) => Self::InvalidDefinition(err.to_string()),
            SharedError::UnknownEngine(_) | SharedError::UnknownGyro(_) => {
                Self::InvalidConfig(err.to_string())
            }
        }
    }
}

/// Result type for criticals operations.
pub type CriticalsResult<T> = Result<T, CriticalsError>;
