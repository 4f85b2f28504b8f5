//! # MECHBAY
//!
//! Editing session for one mech: a single-writer controller over the
//! critical-slot core with a change log, a change feed and subscriber
//! notification.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────┐     ┌─────────────────┐
//! │     Host     │────>│  UnitStateController │────>│  Reconstructor  │
//! │ (UI, server) │     │   (single writer)    │     │ (rebuild+migrate)│
//! └──────┬───────┘     └──────────┬───────────┘     └────────┬────────┘
//!        │   subscribe / feed     │ owns                     │ returns
//!        │<───────────────────────┤                          v
//!        │                        └──────────────────> UnitManager
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use mechbay::{ControllerConfig, UnitStateController};
//! use mechbay_shared::{EngineType, Location};
//!
//! let mut controller = UnitStateController::new(ControllerConfig::load(path)?)?;
//! let _token = controller.subscribe(|| redraw());
//! controller.add_equipment(&ac10, Location::LeftTorso, None)?;
//! let report = controller.change_engine(EngineType::Xl)?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod events;
pub mod shared;
pub mod state;

pub use config::{ConfigError, ControllerConfig};
pub use events::{Change, ChangeEvent, ChangeKind, ChangeReceiver};
pub use shared::SharedUnitState;
pub use state::{SubscriberFn, Subscription, UnitReport, UnitStateController};
