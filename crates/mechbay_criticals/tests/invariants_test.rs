//! Property tests: random operation sequences never lose equipment and
//! never leave a unit inconsistent.

use mechbay_criticals::{ReconstructionOptions, Reconstructor, UnitManager};
use mechbay_shared::{
    EngineType, EquipmentCategory, EquipmentDefinition, GyroType, Location, UnitConfiguration,
};
use proptest::prelude::*;

const CATEGORIES: [EquipmentCategory; 4] = [
    EquipmentCategory::Weapon,
    EquipmentCategory::Equipment,
    EquipmentCategory::HeatSink,
    EquipmentCategory::Ammo,
];

fn definition(slots: u8, category: u8) -> EquipmentDefinition {
    let slots = usize::from(slots % 7) + 1;
    let category = CATEGORIES[usize::from(category) % CATEGORIES.len()];
    EquipmentDefinition::new(format!("item_{slots}"), format!("Item {slots}"), slots, category)
        .unwrap()
}

fn location(raw: u8) -> Location {
    Location::ALL[usize::from(raw) % Location::ALL.len()]
}

/// Picks the n-th equipment id on the unit, if any.
fn pick(unit: &UnitManager, raw: u8) -> Option<mechbay_criticals::GroupId> {
    let all = unit.all_equipment();
    if all.is_empty() {
        return None;
    }
    Some(all[usize::from(raw) % all.len()].group_id())
}

proptest! {
    #[test]
    fn operations_conserve_equipment(
        ops in proptest::collection::vec((0u8..8, any::<u8>(), any::<u8>(), 0u8..12), 1..60),
    ) {
        let mut unit = UnitManager::new(UnitConfiguration::default()).unwrap();
        let mut expected = 0usize;

        for (op, a, b, c) in ops {
            match op {
                0 => {
                    let start = if c % 2 == 0 { None } else { Some(usize::from(c)) };
                    if unit.place(&definition(a, b), location(b), start).is_ok() {
                        expected += 1;
                    }
                }
                1 => {
                    unit.add_definition_to_pool(definition(a, b));
                    expected += 1;
                }
                2 => {
                    if let Some(id) = pick(&unit, a) {
                        let _ = unit.displace(id);
                    }
                }
                3 => {
                    if let Some(id) = pick(&unit, a) {
                        let _ = unit.allocate_from_pool(id, location(b), usize::from(c));
                    }
                }
                4 => {
                    if let Some(id) = pick(&unit, a) {
                        let _ = unit.relocate(id, location(b), usize::from(c));
                    }
                }
                5 => {
                    if let Some(id) = pick(&unit, a) {
                        if unit.delete(id).is_ok() {
                            expected -= 1;
                        }
                    }
                }
                _ => {
                    let configuration = UnitConfiguration::default()
                        .with_engine(EngineType::ALL[usize::from(a) % EngineType::ALL.len()])
                        .with_gyro(GyroType::ALL[usize::from(b) % GyroType::ALL.len()]);
                    let options = if c % 2 == 0 {
                        ReconstructionOptions::default()
                    } else {
                        ReconstructionOptions::displace_conflicts()
                    };
                    let rebuilt = Reconstructor::new(options).reconstruct(&unit, configuration).unwrap();
                    prop_assert_eq!(rebuilt.report.summary.total, expected);
                    unit = rebuilt.unit;
                }
            }

            prop_assert_eq!(unit.summary().total_equipment(), expected);
            let validation = unit.validate();
            prop_assert!(validation.is_valid(), "{:?}", validation.errors);
        }
    }

    #[test]
    fn reservations_never_hold_equipment(
        engine in 0usize..5,
        gyro in 0usize..4,
        sizes in proptest::collection::vec(1usize..8, 0..30),
    ) {
        let configuration = UnitConfiguration::default()
            .with_engine(EngineType::ALL[engine])
            .with_gyro(GyroType::ALL[gyro]);
        let mut unit = UnitManager::new(configuration).unwrap();
        let filler = EquipmentDefinition::new("filler", "Filler", 1, EquipmentCategory::Equipment).unwrap();

        for (n, size) in sizes.into_iter().enumerate() {
            let item = EquipmentDefinition::new("x", "X", size, EquipmentCategory::Weapon).unwrap();
            let _ = unit.place(&item, location(u8::try_from(n % 8).unwrap()), None);
            let _ = unit.place(&filler, Location::CenterTorso, None);
        }

        for section in unit.all_sections() {
            for slot in section.all_slots() {
                prop_assert!(!(slot.is_system() && slot.has_equipment()));
            }
        }
        prop_assert!(unit.validate().is_valid());
    }
}
