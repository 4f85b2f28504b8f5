//! # Chassis Locations
//!
//! The eight named body locations of a biped chassis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SharedError;

/// A named location on the chassis.
///
/// The declaration order is the canonical iteration order used everywhere a
/// deterministic walk over the unit is required.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Location {
    /// Head.
    #[serde(rename = "Head")]
    Head,
    /// Center torso.
    #[serde(rename = "Center Torso")]
    CenterTorso,
    /// Left torso.
    #[serde(rename = "Left Torso")]
    LeftTorso,
    /// Right torso.
    #[serde(rename = "Right Torso")]
    RightTorso,
    /// Left arm.
    #[serde(rename = "Left Arm")]
    LeftArm,
    /// Right arm.
    #[serde(rename = "Right Arm")]
    RightArm,
    /// Left leg.
    #[serde(rename = "Left Leg")]
    LeftLeg,
    /// Right leg.
    #[serde(rename = "Right Leg")]
    RightLeg,
}

impl Location {
    /// Every location, in canonical order.
    pub const ALL: [Self; 8] = [
        Self::Head,
        Self::CenterTorso,
        Self::LeftTorso,
        Self::RightTorso,
        Self::LeftArm,
        Self::RightArm,
        Self::LeftLeg,
        Self::RightLeg,
    ];

    /// Order in which displaced equipment looks for a new home:
    /// torsos, then arms, then legs, head last.
    pub const MIGRATION_PREFERENCE: [Self; 8] = [
        Self::CenterTorso,
        Self::LeftTorso,
        Self::RightTorso,
        Self::LeftArm,
        Self::RightArm,
        Self::LeftLeg,
        Self::RightLeg,
        Self::Head,
    ];

    /// Human-readable name ("Center Torso").
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Head => "Head",
            Self::CenterTorso => "Center Torso",
            Self::LeftTorso => "Left Torso",
            Self::RightTorso => "Right Torso",
            Self::LeftArm => "Left Arm",
            Self::RightArm => "Right Arm",
            Self::LeftLeg => "Left Leg",
            Self::RightLeg => "Right Leg",
        }
    }

    /// Record-sheet abbreviation ("CT").
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Head => "HD",
            Self::CenterTorso => "CT",
            Self::LeftTorso => "LT",
            Self::RightTorso => "RT",
            Self::LeftArm => "LA",
            Self::RightArm => "RA",
            Self::LeftLeg => "LL",
            Self::RightLeg => "RL",
        }
    }

    /// Position of this location in [`Location::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true for the three torso locations.
    #[inline]
    #[must_use]
    pub const fn is_torso(self) -> bool {
        matches!(self, Self::CenterTorso | Self::LeftTorso | Self::RightTorso)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Location {
    type Err = SharedError;

    /// Accepts the full name or the abbreviation, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|loc| {
                loc.name().eq_ignore_ascii_case(trimmed)
                    || loc.abbreviation().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| SharedError::UnknownLocation(s.to_string()))
    }
}
