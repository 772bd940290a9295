//! Criterion benchmarks for ledger aggregation and auto-add.
//!
//! Three benchmark groups:
//! - `ledger_add`: place a wide mix of module groups into an empty ledger
//! - `settings_change`: re-apply efficiency across a populated ledger
//! - `auto_add`: expand deep production chains until nothing is short

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use stationplan_core::catalog::Catalog;
use stationplan_core::config::AutoAddConfig;
use stationplan_core::ledger::{ModuleOrder, ProductLedger};
use stationplan_core::production::ProductionSettings;
use stationplan_core::shortfall::AutoAdd;
use stationplan_core::station::Station;
use stationplan_core::test_utils::*;

// ===========================================================================
// Station builders
// ===========================================================================

/// One order per chain tier, with counts growing toward the raw end.
fn chain_orders(catalog: &Catalog, depth: u32) -> Vec<ModuleOrder> {
    (1..=depth)
        .map(|tier| order(catalog, &format!("prod_t{tier}"), depth - tier + 1))
        .collect()
}

fn sample_orders(catalog: &Catalog) -> Vec<ModuleOrder> {
    vec![
        order(catalog, "prod_energycells", 40),
        order(catalog, "prod_refinedmetals", 20),
        order(catalog, "prod_solarcells", 10),
        order(catalog, "prod_hullparts", 8),
        order(catalog, "prod_hullparts", 4).with_method("teladi"),
        order(catalog, "hab_argon_s", 6),
    ]
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_ledger_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_add");
    let settings = ProductionSettings::new(1.0, 100.0);

    let sample = sample_catalog();
    let orders = sample_orders(&sample);
    group.bench_function("sample_mix", |b| {
        b.iter(|| {
            let mut ledger = ProductLedger::new();
            ledger.add_modules(&sample, &settings, &orders).unwrap();
            ledger
        })
    });

    for depth in [8u32, 32, 128] {
        let catalog = chain_catalog(depth);
        let orders = chain_orders(&catalog, depth);
        group.bench_with_input(BenchmarkId::new("chain", depth), &orders, |b, orders| {
            b.iter(|| {
                let mut ledger = ProductLedger::new();
                ledger.add_modules(&catalog, &settings, orders).unwrap();
                ledger
            })
        });
    }
    group.finish();
}

fn bench_settings_change(c: &mut Criterion) {
    let catalog = Arc::new(sample_catalog());
    let mut station = Station::new(Arc::clone(&catalog), ProductionSettings::new(0.0, 100.0));
    station.place_modules(&sample_orders(&catalog)).unwrap();

    let mut toggle = false;
    c.bench_function("settings_change", |b| {
        b.iter(|| {
            toggle = !toggle;
            let workforce = if toggle { 1.0 } else { 0.0 };
            station.update_settings(workforce, 50.0)
        })
    });
}

fn bench_auto_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_add");
    for depth in [4u32, 8, 16] {
        let catalog = Arc::new(chain_catalog(depth));
        let top = order(&catalog, &format!("prod_t{depth}"), 1);
        let config = AutoAddConfig {
            max_passes: depth + 1,
        };
        group.bench_with_input(BenchmarkId::new("chain", depth), &top, |b, top| {
            b.iter(|| {
                let mut station =
                    Station::new(Arc::clone(&catalog), ProductionSettings::new(0.0, 100.0));
                station.place_modules(std::slice::from_ref(top)).unwrap();
                AutoAdd::new(&config).run(&mut station).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_ledger_add,
    bench_settings_change,
    bench_auto_add
);
criterion_main!(benches);
