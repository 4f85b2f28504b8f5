//! # Reconstructor
//!
//! Applies an engine or gyro change by building a brand-new unit and
//! re-placing every piece of equipment the old unit knew about, placed or
//! pooled. The old unit is only read, never modified.
//!
//! ## Migration order (`MigrationMode::Migrate`)
//!
//! 1. Items that had a location before pooled-only items (when preserving
//!    location).
//! 2. Fewer required slots first.
//! 3. Weapon, equipment, heat sink, ammo.
//! 4. Otherwise collection order: sections in canonical order by start
//!    slot, then the pool.
//!
//! When preserving location, every item first tries its exact previous
//! slots; the leftovers then try their previous location, then the
//! preferred locations (torsos, arms, legs, head) with a large enough run.
//! Anything still homeless goes to the new pool. Each item crossing the
//! rebuild gets a fresh group id; the report maps old ids to new ones.

use mechbay_shared::{EngineType, GyroType, Location, UnitConfiguration};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::allocation::{EquipmentAllocation, GroupId, Placement};
use crate::error::CriticalsResult;
use crate::options::{MigrationMode, ReconstructionOptions};
use crate::rules::{self, DisplacementImpact, ValidationResult};
use crate::unit::UnitManager;

/// Above this many displaced items a preview adds a high-impact warning.
const HIGH_DISPLACEMENT_COUNT: usize = 5;

/// Where one item ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MigrationResult {
    /// Same location and start slot as before.
    Retained(Placement),
    /// Placed somewhere else, or placed after being pooled.
    Relocated(Placement),
    /// In the new unit's pool.
    Unallocated,
}

/// Outcome for one item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    /// Group id on the old unit.
    pub previous_group: GroupId,
    /// Group id on the new unit.
    pub group_id: GroupId,
    /// Equipment name.
    pub name: String,
    /// Placement on the old unit.
    pub from: Option<Placement>,
    /// Result on the new unit.
    pub result: MigrationResult,
}

/// Counts over a reconstruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconstructionSummary {
    /// Items carried over.
    pub total: usize,
    /// Items at their previous position.
    pub retained: usize,
    /// Items placed at a new position.
    pub relocated: usize,
    /// Items left in the pool.
    pub unallocated: usize,
}

/// What a reconstruction did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconstructionReport {
    /// One entry per item, in collection order.
    pub outcomes: Vec<MigrationOutcome>,
    /// Counts.
    pub summary: ReconstructionSummary,
}

impl ReconstructionReport {
    /// Returns true if no item was carried over.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Items left at their previous position.
    pub fn retained(&self) -> impl Iterator<Item = &MigrationOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, MigrationResult::Retained(_)))
    }

    /// Items placed at a new position.
    pub fn relocated(&self) -> impl Iterator<Item = &MigrationOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, MigrationResult::Relocated(_)))
    }

    /// Items left in the pool.
    pub fn unallocated(&self) -> impl Iterator<Item = &MigrationOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.result == MigrationResult::Unallocated)
    }

    /// New group id for an old one.
    #[must_use]
    pub fn new_group_for(&self, previous: GroupId) -> Option<GroupId> {
        self.outcomes
            .iter()
            .find(|o| o.previous_group == previous)
            .map(|o| o.group_id)
    }
}

/// A rebuilt unit and its report.
#[derive(Clone, Debug)]
pub struct Reconstruction {
    /// The new unit.
    pub unit: UnitManager,
    /// What happened to each item.
    pub report: ReconstructionReport,
}

/// Read-only look at what a change would do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangePreview {
    /// Engine/gyro combination check.
    pub validation: ValidationResult,
    /// Newly reserved slots.
    pub impact: DisplacementImpact,
    /// Placed items overlapping the newly reserved slots.
    pub displaced: Vec<GroupId>,
    /// Validation warnings plus displacement warnings.
    pub warnings: Vec<String>,
}

impl ChangePreview {
    /// Number of placed items the change would clash with.
    #[inline]
    #[must_use]
    pub fn displaced_count(&self) -> usize {
        self.displaced.len()
    }

    /// Locations gaining reserved slots.
    #[must_use]
    pub fn affected_locations(&self) -> Vec<Location> {
        self.impact.affected_locations()
    }
}

/// One item to carry across.
struct Candidate {
    allocation: EquipmentAllocation,
    from: Option<Placement>,
}

impl Candidate {
    /// Places this item at `location`/`start` on `unit`.
    fn place_at(&self, unit: &mut UnitManager, location: Location, start: usize) -> Option<(GroupId, Placement)> {
        unit.place(self.allocation.definition(), location, Some(start))
            .ok()
            .map(|group_id| (group_id, Placement::new(location, start)))
    }
}

/// Rebuilds units on engine/gyro changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reconstructor {
    options: ReconstructionOptions,
}

impl Reconstructor {
    /// Creates a reconstructor.
    #[must_use]
    pub const fn new(options: ReconstructionOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &ReconstructionOptions {
        &self.options
    }

    /// Builds a fresh unit for `configuration` and carries every item of
    /// `unit` into it.
    ///
    /// # Errors
    ///
    /// Returns `CriticalsError::InvalidCombination` if the new engine/gyro
    /// pair does not fit. `unit` is untouched either way.
    pub fn reconstruct(
        &self,
        unit: &UnitManager,
        configuration: UnitConfiguration,
    ) -> CriticalsResult<Reconstruction> {
        let engine = configuration.engine_type;
        let gyro = configuration.gyro_type;
        let mut fresh = UnitManager::new(configuration)?;

        let candidates: Vec<Candidate> = unit
            .all_equipment()
            .into_iter()
            .map(|alloc| Candidate {
                allocation: alloc.clone(),
                from: alloc.placement(),
            })
            .collect();

        let placed = match self.options.mode {
            MigrationMode::Migrate => self.migrate(&candidates, &mut fresh),
            MigrationMode::DisplaceConflicts => Self::displace_conflicts(&candidates, &mut fresh),
        };

        let mut report = ReconstructionReport::default();
        for (candidate, placement) in candidates.iter().zip(placed) {
            let (group_id, result) = match placement {
                Some((group_id, at)) if candidate.from == Some(at) => {
                    report.summary.retained += 1;
                    (group_id, MigrationResult::Retained(at))
                }
                Some((group_id, at)) => {
                    report.summary.relocated += 1;
                    debug!(equipment = %candidate.allocation.name(), to = %at, "equipment relocated");
                    (group_id, MigrationResult::Relocated(at))
                }
                None => {
                    report.summary.unallocated += 1;
                    if let Some(from) = candidate.from {
                        warn!(equipment = %candidate.allocation.name(), from = %from, "equipment moved to unallocated pool");
                    }
                    let group_id = fresh.add_definition_to_pool(candidate.allocation.definition().clone());
                    (group_id, MigrationResult::Unallocated)
                }
            };

            report.outcomes.push(MigrationOutcome {
                previous_group: candidate.allocation.group_id(),
                group_id,
                name: candidate.allocation.name().to_string(),
                from: candidate.from,
                result,
            });
        }
        report.summary.total = report.outcomes.len();

        info!(
            engine = %engine,
            gyro = %gyro,
            total = report.summary.total,
            retained = report.summary.retained,
            relocated = report.summary.relocated,
            unallocated = report.summary.unallocated,
            "unit reconstructed"
        );

        Ok(Reconstruction {
            unit: fresh,
            report,
        })
    }

    /// Priority migration. Returns one entry per candidate.
    fn migrate(&self, candidates: &[Candidate], fresh: &mut UnitManager) -> Vec<Option<(GroupId, Placement)>> {
        let preserve = self.options.preserve_location;

        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by_key(|&i| {
            let alloc = &candidates[i].allocation;
            (
                preserve && candidates[i].from.is_none(),
                alloc.required_slots(),
                alloc.category().migration_rank(),
            )
        });

        let mut placed: Vec<Option<(GroupId, Placement)>> = vec![None; candidates.len()];

        if preserve {
            for &i in &order {
                if let Some(from) = candidates[i].from {
                    placed[i] = candidates[i].place_at(fresh, from.location, from.start);
                }
            }
        }

        let runs = rules::max_contiguous_equipment_run(fresh.engine_type(), fresh.gyro_type());
        for &i in &order {
            if placed[i].is_some() {
                continue;
            }
            let candidate = &candidates[i];
            let required = candidate.allocation.required_slots();

            let origin = candidate.from.filter(|_| preserve).map(|from| from.location);
            let preferred = Location::MIGRATION_PREFERENCE
                .into_iter()
                .filter(|&location| Some(location) != origin)
                .filter(|location| runs.get(location).is_some_and(|&run| run >= required));

            placed[i] = origin.into_iter().chain(preferred).find_map(|location| {
                let start = fresh.section(location).find_contiguous(required)?;
                candidate.place_at(fresh, location, start)
            });
        }

        placed
    }

    /// Keeps non-conflicting items in place; everything else is pooled.
    fn displace_conflicts(candidates: &[Candidate], fresh: &mut UnitManager) -> Vec<Option<(GroupId, Placement)>> {
        candidates
            .iter()
            .map(|candidate| {
                let from = candidate.from?;
                candidate.place_at(fresh, from.location, from.start)
            })
            .collect()
    }

    /// Validation, impact and displacement count for switching `unit` to
    /// `engine`/`gyro`. Nothing is modified.
    #[must_use]
    pub fn preview(unit: &UnitManager, engine: EngineType, gyro: GyroType) -> ChangePreview {
        let validation = rules::validate_combination(engine, gyro);
        let impact = rules::displacement_impact(unit.engine_type(), unit.gyro_type(), engine, gyro);

        let displaced: Vec<GroupId> = impact
            .newly_reserved
            .iter()
            .flat_map(|(&location, slots)| unit.section(location).find_conflicting(slots))
            .collect();

        let mut warnings = validation.warnings.clone();
        if !displaced.is_empty() {
            warnings.push(format!("{} equipment item(s) will be displaced", displaced.len()));
        }
        if displaced.len() > HIGH_DISPLACEMENT_COUNT {
            warnings.push(
                "High number of equipment displacements - consider alternative configuration"
                    .to_string(),
            );
        }

        ChangePreview {
            validation,
            impact,
            displaced,
            warnings,
        }
    }
}
