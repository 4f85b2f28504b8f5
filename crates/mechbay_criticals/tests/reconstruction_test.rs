//! Integration tests for engine/gyro reconstruction.

use mechbay_criticals::{
    GroupId, MigrationResult, Placement, ReconstructionOptions, Reconstructor, UnitManager,
};
use mechbay_shared::{
    EngineType, EquipmentCategory, EquipmentDefinition, GyroType, Location, UnitConfiguration,
};

fn ac10() -> EquipmentDefinition {
    EquipmentDefinition::new("ac10", "AC/10", 7, EquipmentCategory::Weapon).unwrap()
}

fn medium_laser() -> EquipmentDefinition {
    EquipmentDefinition::new("ml", "Medium Laser", 1, EquipmentCategory::Weapon).unwrap()
}

fn heat_sink() -> EquipmentDefinition {
    EquipmentDefinition::new("hs", "Heat Sink", 1, EquipmentCategory::HeatSink).unwrap()
}

struct Loadout {
    unit: UnitManager,
    ac10: GroupId,
    laser: GroupId,
    sink: GroupId,
}

/// AC/10 at LT 0, medium laser at RT 0, heat sink at CT 9.
fn loadout(gyro: GyroType) -> Loadout {
    let mut unit = UnitManager::new(UnitConfiguration::default().with_gyro(gyro)).unwrap();
    let ac10 = unit.place(&ac10(), Location::LeftTorso, Some(0)).unwrap();
    let laser = unit.place(&medium_laser(), Location::RightTorso, Some(0)).unwrap();
    let sink = unit.place(&heat_sink(), Location::CenterTorso, Some(9)).unwrap();
    Loadout {
        unit,
        ac10,
        laser,
        sink,
    }
}

fn xl(gyro: GyroType) -> UnitConfiguration {
    UnitConfiguration::default()
        .with_engine(EngineType::Xl)
        .with_gyro(gyro)
}

fn result_for(report: &mechbay_criticals::ReconstructionReport, previous: GroupId) -> MigrationResult {
    report
        .outcomes
        .iter()
        .find(|o| o.previous_group == previous)
        .map(|o| o.result)
        .unwrap()
}

#[test]
fn test_migrate_relocates_everything_on_xl_switch() {
    let before = loadout(GyroType::Standard);
    let rebuilt = Reconstructor::default()
        .reconstruct(&before.unit, xl(GyroType::Standard))
        .unwrap();
    let report = &rebuilt.report;

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.relocated, 3);
    assert_eq!(report.summary.unallocated, 0);

    assert_eq!(
        result_for(report, before.laser),
        MigrationResult::Relocated(Placement::new(Location::RightTorso, 3))
    );
    assert_eq!(
        result_for(report, before.sink),
        MigrationResult::Relocated(Placement::new(Location::CenterTorso, 10))
    );
    assert_eq!(
        result_for(report, before.ac10),
        MigrationResult::Relocated(Placement::new(Location::LeftTorso, 3))
    );

    let new_ac10 = report.new_group_for(before.ac10).unwrap();
    assert_ne!(new_ac10, before.ac10);
    assert_eq!(
        rebuilt.unit.find_equipment(new_ac10).unwrap().occupied_slots(),
        &[3, 4, 5, 6, 7, 8, 9]
    );
    assert!(rebuilt.unit.validate().is_valid());
}

#[test]
fn test_displace_conflicts_pools_every_clash() {
    let before = loadout(GyroType::Standard);
    let rebuilt = Reconstructor::new(ReconstructionOptions::displace_conflicts())
        .reconstruct(&before.unit, xl(GyroType::Standard))
        .unwrap();

    assert_eq!(rebuilt.report.summary.unallocated, 3);
    assert_eq!(rebuilt.unit.unallocated_count(), 3);
    assert_eq!(rebuilt.unit.allocated_count(), 0);
}

#[test]
fn test_displace_conflicts_with_compact_gyro_keeps_heat_sink() {
    let before = loadout(GyroType::Compact);
    let rebuilt = Reconstructor::new(ReconstructionOptions::displace_conflicts())
        .reconstruct(&before.unit, xl(GyroType::Compact))
        .unwrap();
    let report = &rebuilt.report;

    assert_eq!(report.summary.unallocated, 2);
    assert_eq!(report.summary.retained, 1);
    assert_eq!(
        result_for(report, before.sink),
        MigrationResult::Retained(Placement::new(Location::CenterTorso, 9))
    );
    assert_eq!(result_for(report, before.ac10), MigrationResult::Unallocated);
    assert_eq!(result_for(report, before.laser), MigrationResult::Unallocated);
}

#[test]
fn test_old_unit_is_untouched() {
    let before = loadout(GyroType::Standard);
    let snapshot = before.unit.clone();
    let _ = Reconstructor::default()
        .reconstruct(&before.unit, xl(GyroType::Standard))
        .unwrap();
    assert_eq!(before.unit, snapshot);
}

#[test]
fn test_round_trip_restores_positions() {
    let before = loadout(GyroType::Standard);
    let reconstructor = Reconstructor::default();
    let there = reconstructor
        .reconstruct(&before.unit, xl(GyroType::Standard))
        .unwrap();
    let back = reconstructor
        .reconstruct(&there.unit, UnitConfiguration::default())
        .unwrap();

    // Every item still fits where the XL layout put it.
    assert_eq!(back.report.summary.retained, 3);
    assert_eq!(back.unit.engine_type(), EngineType::Standard);

    let fresh = UnitManager::new(UnitConfiguration::default()).unwrap();
    for location in Location::ALL {
        assert_eq!(
            back.unit.section(location).system_slot_count(),
            fresh.section(location).system_slot_count()
        );
    }
}

#[test]
fn test_round_trip_of_empty_unit_is_identity() {
    let unit = UnitManager::new(UnitConfiguration::default()).unwrap();
    let reconstructor = Reconstructor::default();
    let there = reconstructor.reconstruct(&unit, xl(GyroType::Xl)).unwrap();
    let back = reconstructor
        .reconstruct(&there.unit, UnitConfiguration::default())
        .unwrap();
    assert_eq!(back.unit, unit);
}

#[test]
fn test_pooled_items_are_carried_and_placed() {
    let mut unit = UnitManager::new(UnitConfiguration::default()).unwrap();
    let pooled = unit.add_definition_to_pool(medium_laser());

    let rebuilt = Reconstructor::default()
        .reconstruct(&unit, xl(GyroType::Standard))
        .unwrap();

    // CT 10 is the first free slot in the XL layout.
    assert_eq!(
        result_for(&rebuilt.report, pooled),
        MigrationResult::Relocated(Placement::new(Location::CenterTorso, 10))
    );
    assert_eq!(rebuilt.unit.unallocated_count(), 0);
}

#[test]
fn test_without_preserve_location_uses_preference_order() {
    let mut unit = UnitManager::new(UnitConfiguration::default()).unwrap();
    let laser = unit
        .place(&medium_laser(), Location::LeftArm, Some(6))
        .unwrap();

    let rebuilt = Reconstructor::new(ReconstructionOptions::default().with_preserve_location(false))
        .reconstruct(&unit, UnitConfiguration::default())
        .unwrap();

    assert_eq!(
        result_for(&rebuilt.report, laser),
        MigrationResult::Relocated(Placement::new(Location::CenterTorso, 7))
    );
}

#[test]
fn test_oversized_item_falls_back_to_pool() {
    // XL engine and XL gyro leave the CT full and side torsos at 9 free.
    let mut unit = UnitManager::new(UnitConfiguration::default()).unwrap();
    let big = EquipmentDefinition::new("big", "Big Gun", 10, EquipmentCategory::Weapon).unwrap();
    let id = unit.place(&big, Location::LeftTorso, Some(0)).unwrap();

    let rebuilt = Reconstructor::default()
        .reconstruct(&unit, xl(GyroType::Xl))
        .unwrap();

    assert_eq!(result_for(&rebuilt.report, id), MigrationResult::Unallocated);
    assert_eq!(rebuilt.unit.unallocated()[0].name(), "Big Gun");
}

#[test]
fn test_equipment_count_is_conserved() {
    let mut before = loadout(GyroType::Standard);
    before.unit.add_definition_to_pool(heat_sink());
    let count = before.unit.summary().total_equipment();

    for options in [
        ReconstructionOptions::default(),
        ReconstructionOptions::displace_conflicts(),
        ReconstructionOptions::default().with_preserve_location(false),
    ] {
        let rebuilt = Reconstructor::new(options)
            .reconstruct(&before.unit, xl(GyroType::Standard))
            .unwrap();
        assert_eq!(rebuilt.unit.summary().total_equipment(), count);
        assert_eq!(rebuilt.report.summary.total, count);
    }
}
