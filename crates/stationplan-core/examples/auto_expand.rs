//! Auto-expand example: place hull part production and let auto-add build
//! the supply chain behind it.
//!
//! Prints the ledger before and after, one line per ware with its
//! per-module breakdown. Set `RUST_LOG=stationplan_core=debug` to watch the
//! ledger updates.
//!
//! Run with: `cargo run -p stationplan-core --example auto_expand --features test-utils`

use stationplan_core::config::AutoAddConfig;
use stationplan_core::fixed::fixed64_to_f64;
use stationplan_core::ledger::DetailRole;
use stationplan_core::shortfall::AutoAdd;
use stationplan_core::station::Station;
use stationplan_core::test_utils::{order, sample_station};
use tracing_subscriber::EnvFilter;

fn print_ledger(station: &Station) {
    let catalog = station.catalog();
    for entry in station.ledger().entries() {
        let name = catalog.ware(entry.ware).map_or("?", |w| w.name.as_str());
        println!("  {name:<16} {:>10.2}/h", fixed64_to_f64(entry.net()));
        for detail in entry.details() {
            let module = catalog.ware(detail.module).map_or("?", |w| w.name.as_str());
            let sign = match detail.role {
                DetailRole::Output => '+',
                DetailRole::Input => '-',
            };
            println!(
                "    {sign} {} x {module} ({}) {:.2}",
                detail.count,
                detail.method,
                fixed64_to_f64(detail.amount()).abs()
            );
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut station = sample_station();

    // --- Step 1: place the product we want ---

    let hull = order(station.catalog(), "prod_hullparts", 4);
    station.place_modules(&[hull]).unwrap();
    println!("Before auto-add ({} modules):", station.module_count());
    print_ledger(&station);

    // --- Step 2: fill every manufactured shortage ---

    let report = AutoAdd::new(&AutoAddConfig::default())
        .run(&mut station)
        .unwrap();
    println!(
        "\nAuto-add finished after {} passes: {:?}",
        report.passes, report.outcome
    );
    for addition in &report.added {
        let module = station
            .catalog()
            .ware(addition.module)
            .map_or("?", |w| w.name.as_str());
        println!("  added {} x {module}", addition.count);
    }

    // --- Step 3: staff the station and look again ---

    let hab = order(station.catalog(), "hab_argon_s", 3);
    station.place_modules(&[hab]).unwrap();
    station.sync_workforce();
    println!(
        "\nAfter auto-add ({} modules, workforce {:.2}):",
        station.module_count(),
        fixed64_to_f64(station.workforce().ratio())
    );
    print_ledger(&station);

    let short: Vec<_> = station
        .ledger()
        .shortages()
        .into_iter()
        .filter_map(|(ware, _)| station.catalog().ware(ware).map(|w| w.name.clone()))
        .collect();
    println!("\nStill short (raw resources): {short:?}");
}
