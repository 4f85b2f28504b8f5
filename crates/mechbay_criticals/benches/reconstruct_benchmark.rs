//! Benchmark for slot search and unit reconstruction.
//!
//! Run with: cargo bench --package mechbay_criticals --bench reconstruct_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mechbay_criticals::{ReconstructionOptions, Reconstructor, UnitManager};
use mechbay_shared::{
    EngineType, EquipmentCategory, EquipmentDefinition, Location, UnitConfiguration,
};

fn loaded_unit() -> UnitManager {
    let mut unit = UnitManager::new(UnitConfiguration::default()).unwrap();
    let laser = EquipmentDefinition::new("ml", "Medium Laser", 1, EquipmentCategory::Weapon).unwrap();
    let srm = EquipmentDefinition::new("srm6", "SRM 6", 2, EquipmentCategory::Weapon).unwrap();
    let ammo = EquipmentDefinition::new("srm_ammo", "SRM Ammo", 1, EquipmentCategory::Ammo).unwrap();

    // Fill every location until nothing more fits.
    for location in Location::ALL {
        while unit.place(&srm, location, None).is_ok() {}
        while unit.place(&laser, location, None).is_ok() {}
    }
    for _ in 0..10 {
        unit.add_definition_to_pool(ammo.clone());
    }
    unit
}

fn benchmark_find_contiguous(c: &mut Criterion) {
    let unit = UnitManager::new(UnitConfiguration::default()).unwrap();
    let section = unit.section(Location::LeftTorso);

    c.bench_function("find_contiguous_left_torso", |b| {
        let mut count = 0usize;
        b.iter(|| {
            count = count % 12 + 1;
            black_box(section.find_contiguous(count))
        });
    });
}

fn benchmark_reconstruct(c: &mut Criterion) {
    let unit = loaded_unit();
    let xl = UnitConfiguration::default().with_engine(EngineType::Xl);

    c.bench_function("reconstruct_migrate_full_unit", |b| {
        let reconstructor = Reconstructor::default();
        b.iter(|| black_box(reconstructor.reconstruct(&unit, xl.clone()).unwrap()));
    });

    c.bench_function("reconstruct_displace_conflicts_full_unit", |b| {
        let reconstructor = Reconstructor::new(ReconstructionOptions::displace_conflicts());
        b.iter(|| black_box(reconstructor.reconstruct(&unit, xl.clone()).unwrap()));
    });
}

fn benchmark_preview(c: &mut Criterion) {
    let unit = loaded_unit();

    c.bench_function("preview_xl_switch", |b| {
        b.iter(|| {
            black_box(Reconstructor::preview(
                &unit,
                EngineType::Xl,
                mechbay_shared::GyroType::Standard,
            ))
        });
    });
}

criterion_group!(
    benches,
    benchmark_find_contiguous,
    benchmark_reconstruct,
    benchmark_preview
);
criterion_main!(benches);
