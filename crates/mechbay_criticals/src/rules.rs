//! # Component Placement Rules
//!
//! Pure functions mapping an (engine, gyro) pair to the critical slots those
//! components claim. Nothing here holds state; the same inputs always
//! produce the same layout.
//!
//! ## Layout
//!
//! ```text
//! Center Torso   0  1  2 | 3  4  5  6 (7  8) | ...
//!                engine  | gyro              | XL engine tail (3 slots)
//! Side torsos    0  1  2   XL only (Light: 0 1)
//! ```

use mechbay_shared::{
    layout, EngineType, GyroType, Location, SystemComponentKind, CENTER_TORSO_SLOTS,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Center-torso slots every engine claims.
const ENGINE_BASE_SLOTS: [usize; 3] = [0, 1, 2];

/// Number of extra center-torso slots an XL engine claims after the gyro.
const XL_ENGINE_TAIL: usize = 3;

/// Above this many newly reserved slots a change counts as high impact.
const MEDIUM_IMPACT_LIMIT: usize = 6;

// =============================================================================
// VALIDATION RESULT
// =============================================================================

/// Errors and warnings from a validation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Blocking problems.
    pub errors: Vec<String>,
    /// Non-blocking notes.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are no errors.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Appends another result.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

// =============================================================================
// SLOT TABLES
// =============================================================================

/// Center-torso slots claimed by `gyro`.
#[must_use]
pub fn gyro_slots(gyro: GyroType) -> Vec<usize> {
    match gyro {
        GyroType::Standard | GyroType::HeavyDuty => (3..=6).collect(),
        GyroType::Xl => (3..=8).collect(),
        GyroType::Compact => vec![3, 4],
    }
}

/// Slots claimed by `engine`, per location. Locations it does not touch are
/// absent.
#[must_use]
pub fn engine_slots(engine: EngineType, gyro: GyroType) -> BTreeMap<Location, Vec<usize>> {
    let mut slots = BTreeMap::new();
    let mut center = ENGINE_BASE_SLOTS.to_vec();

    match engine {
        EngineType::Xl => {
            let gyro_end = gyro_slots(gyro).last().copied().unwrap_or(2);
            center.extend(gyro_end + 1..=gyro_end + XL_ENGINE_TAIL);
            slots.insert(Location::LeftTorso, vec![0, 1, 2]);
            slots.insert(Location::RightTorso, vec![0, 1, 2]);
        }
        EngineType::Light => {
            slots.insert(Location::LeftTorso, vec![0, 1]);
            slots.insert(Location::RightTorso, vec![0, 1]);
        }
        EngineType::Standard | EngineType::Xxl | EngineType::Compact => {}
    }

    slots.insert(Location::CenterTorso, center);
    slots
}

/// The complete engine and gyro layout for one configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemLayout {
    engine: BTreeMap<Location, Vec<usize>>,
    gyro: Vec<usize>,
}

impl SystemLayout {
    /// Computes the layout for `engine` and `gyro`.
    #[must_use]
    pub fn new(engine: EngineType, gyro: GyroType) -> Self {
        Self {
            engine: engine_slots(engine, gyro),
            gyro: gyro_slots(gyro),
        }
    }

    /// Engine slots in `location`.
    #[must_use]
    pub fn engine_slots(&self, location: Location) -> &[usize] {
        self.engine
            .get(&location)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Gyro slots (center torso only).
    #[must_use]
    pub fn gyro_slots(&self) -> &[usize] {
        &self.gyro
    }

    /// Engine and gyro slots in `location`, sorted, possibly with repeats if
    /// the two overlap.
    #[must_use]
    pub fn reserved(&self, location: Location) -> Vec<usize> {
        let mut slots = self.engine_slots(location).to_vec();
        if location == Location::CenterTorso {
            slots.extend_from_slice(&self.gyro);
        }
        slots.sort_unstable();
        slots
    }

    /// `(location, kind, slots)` for every non-empty reservation, engine
    /// before gyro.
    #[must_use]
    pub fn reservations(&self) -> Vec<(Location, SystemComponentKind, &[usize])> {
        let mut out: Vec<_> = self
            .engine
            .iter()
            .filter(|(_, slots)| !slots.is_empty())
            .map(|(&location, slots)| (location, SystemComponentKind::Engine, slots.as_slice()))
            .collect();
        out.push((Location::CenterTorso, SystemComponentKind::Gyro, self.gyro.as_slice()));
        out
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Checks that `engine` and `gyro` fit the center torso without overlap.
#[must_use]
pub fn validate_combination(engine: EngineType, gyro: GyroType) -> ValidationResult {
    let mut result = ValidationResult::default();
    let center = SystemLayout::new(engine, gyro).reserved(Location::CenterTorso);

    if let Some(&max) = center.last() {
        if max >= CENTER_TORSO_SLOTS {
            result.errors.push(format!(
                "{engine} engine with {gyro} gyro requires slot {}, but Center Torso only has {CENTER_TORSO_SLOTS} slots",
                max + 1
            ));
        }
    }

    if engine == EngineType::Xxl && gyro == GyroType::Xl {
        result
            .warnings
            .push("XXL Engine with XL Gyro combination may be unstable".to_string());
    }

    if center.windows(2).any(|pair| pair[0] == pair[1]) {
        result
            .errors
            .push("System component slot overlap detected".to_string());
    }

    result
}

// =============================================================================
// CAPACITY
// =============================================================================

/// Per location, the indices neither fixed nor claimed by engine or gyro.
#[must_use]
pub fn available_equipment_slots(engine: EngineType, gyro: GyroType) -> BTreeMap<Location, Vec<usize>> {
    let system = SystemLayout::new(engine, gyro);
    Location::ALL
        .into_iter()
        .map(|location| {
            let table = layout(location);
            let reserved = system.reserved(location);
            let free = (0..table.total_slots)
                .filter(|index| {
                    !reserved.contains(index)
                        && !table.fixed.iter().any(|fixed| fixed.slot_index == *index)
                })
                .collect();
            (location, free)
        })
        .collect()
}

/// Per location, the longest run of free indices.
#[must_use]
pub fn max_contiguous_equipment_run(engine: EngineType, gyro: GyroType) -> BTreeMap<Location, usize> {
    available_equipment_slots(engine, gyro)
        .into_iter()
        .map(|(location, free)| (location, longest_run(&free)))
        .collect()
}

/// Returns true if `required_slots` could fit somewhere in `location` on an
/// otherwise empty unit with this configuration.
#[must_use]
pub fn can_equipment_fit(
    required_slots: usize,
    location: Location,
    engine: EngineType,
    gyro: GyroType,
) -> bool {
    max_contiguous_equipment_run(engine, gyro)
        .get(&location)
        .is_some_and(|&run| run >= required_slots)
}

/// Longest run of consecutive values in an ascending list.
fn longest_run(sorted: &[usize]) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    let mut best = 1;
    let mut current = 1;
    for pair in sorted.windows(2) {
        if pair[1] == pair[0] + 1 {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
    }
    best
}

// =============================================================================
// DISPLACEMENT IMPACT
// =============================================================================

/// Coarse size of a configuration change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplacementSeverity {
    /// No slot becomes reserved. Also read from `low` when deserializing.
    #[serde(alias = "low")]
    None,
    /// Up to six slots become reserved.
    Medium,
    /// More than six.
    High,
}

impl fmt::Display for DisplacementSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Slots that move from free to reserved under a configuration change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplacementImpact {
    /// Newly reserved indices per affected location.
    pub newly_reserved: BTreeMap<Location, Vec<usize>>,
    /// Severity bucket.
    pub severity: DisplacementSeverity,
}

impl DisplacementImpact {
    /// Locations with at least one newly reserved slot.
    #[must_use]
    pub fn affected_locations(&self) -> Vec<Location> {
        self.newly_reserved.keys().copied().collect()
    }

    /// Total newly reserved slots.
    #[must_use]
    pub fn total_slots(&self) -> usize {
        self.newly_reserved.values().map(Vec::len).sum()
    }
}

/// Computes which slots become reserved going from the old to the new
/// configuration. Informational only.
#[must_use]
pub fn displacement_impact(
    old_engine: EngineType,
    old_gyro: GyroType,
    new_engine: EngineType,
    new_gyro: GyroType,
) -> DisplacementImpact {
    let old = SystemLayout::new(old_engine, old_gyro);
    let new = SystemLayout::new(new_engine, new_gyro);

    let mut newly_reserved = BTreeMap::new();
    for location in Location::ALL {
        let before = old.reserved(location);
        let mut added: Vec<usize> = new
            .reserved(location)
            .into_iter()
            .filter(|index| !before.contains(index))
            .collect();
        added.dedup();
        if !added.is_empty() {
            newly_reserved.insert(location, added);
        }
    }

    let total: usize = newly_reserved.values().map(Vec::len).sum();
    let severity = match total {
        0 => DisplacementSeverity::None,
        n if n <= MEDIUM_IMPACT_LIMIT => DisplacementSeverity::Medium,
        _ => DisplacementSeverity::High,
    };

    DisplacementImpact {
        newly_reserved,
        severity,
    }
}

// =============================================================================
// DESCRIPTIONS
// =============================================================================

fn one_based(slots: &[usize]) -> String {
    slots
        .iter()
        .map(|slot| (slot + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Multi-line, 1-based description of where engine and gyro sit.
#[must_use]
pub fn describe_system(engine: EngineType, gyro: GyroType) -> String {
    let system = SystemLayout::new(engine, gyro);
    let center = system.engine_slots(Location::CenterTorso);

    let mut lines = Vec::new();
    if center.len() > ENGINE_BASE_SLOTS.len() {
        lines.push(format!("{engine} Engine: CT slots {}", one_based(center)));
    } else {
        lines.push(format!("{engine} Engine: CT slots 1-3"));
    }
    for side in [Location::LeftTorso, Location::RightTorso] {
        let slots = system.engine_slots(side);
        if !slots.is_empty() {
            lines.push(format!("  + {} slots {}", side.abbreviation(), one_based(slots)));
        }
    }
    lines.push(format!(
        "{gyro} Gyro: CT slots {}",
        one_based(system.gyro_slots())
    ));

    lines.join("\n")
}

/// Describes an engine/gyro change followed by the new layout.
#[must_use]
pub fn describe_change(
    old_engine: EngineType,
    old_gyro: GyroType,
    new_engine: EngineType,
    new_gyro: GyroType,
) -> String {
    let mut changes = Vec::new();
    if old_engine != new_engine {
        changes.push(format!("Engine: {old_engine} → {new_engine}"));
    }
    if old_gyro != new_gyro {
        changes.push(format!("Gyro: {old_gyro} → {new_gyro}"));
    }
    if changes.is_empty() {
        return "No system component changes".to_string();
    }

    format!(
        "{}\n\nNew Configuration:\n{}",
        changes.join("\n"),
        describe_system(new_engine, new_gyro)
    )
}
