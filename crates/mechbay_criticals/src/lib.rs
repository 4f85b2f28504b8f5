//! # MECHBAY Criticals
//!
//! Critical-slot allocation for a mech chassis.
//!
//! ## Design Principles
//!
//! 1. **Fixed chassis** - Eight locations, 78 slots, actuators and cockpit
//!    pinned at construction
//! 2. **Systems first** - Engine and gyro slots are reserved before any
//!    equipment is placed
//! 3. **All-or-nothing** - A failed placement or move leaves the unit as it
//!    was
//! 4. **Conservation** - Only deletion removes an item; everything else
//!    moves it between sections and the unallocated pool
//! 5. **Rebuild, don't patch** - Engine/gyro changes construct a new unit
//!    and migrate equipment into it
//!
//! ## Example
//!
//! ```rust,ignore
//! use mechbay_criticals::{Reconstructor, UnitManager};
//! use mechbay_shared::{EngineType, Location, UnitConfiguration};
//!
//! let mut unit = UnitManager::new(UnitConfiguration::default())?;
//! unit.place(&ac10, Location::LeftTorso, None)?;
//!
//! let rebuilt = Reconstructor::default()
//!     .reconstruct(&unit, UnitConfiguration::default().with_engine(EngineType::Xl))?;
//! println!("{} relocated", rebuilt.report.summary.relocated);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod allocation;
pub mod error;
pub mod options;
pub mod reconstruct;
pub mod rules;
pub mod section;
pub mod slot;
pub mod unit;

pub use allocation::{EquipmentAllocation, GroupId, Placement};
pub use error::{CriticalsError, CriticalsResult};
pub use options::{MigrationMode, ReconstructionOptions};
pub use reconstruct::{
    ChangePreview, MigrationOutcome, MigrationResult, Reconstruction, ReconstructionReport,
    ReconstructionSummary, Reconstructor,
};
pub use rules::{
    DisplacementImpact, DisplacementSeverity, SystemLayout, ValidationResult,
};
pub use section::Section;
pub use slot::{Slot, SlotContent, EMPTY_SLOT_NAME};
pub use unit::{EquipmentBucket, SpecialComponentChange, UnitManager, UnitSummary};
