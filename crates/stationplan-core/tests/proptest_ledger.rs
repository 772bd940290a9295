//! Property-based tests for the ledger and auto-add.
//!
//! Random module orders are placed on the sample catalog, and random chain
//! depths are expanded, then structural invariants are checked.

use std::sync::Arc;

use proptest::prelude::*;
use stationplan_core::catalog::Catalog;
use stationplan_core::config::AutoAddConfig;
use stationplan_core::fixed::Fixed64;
use stationplan_core::ledger::{ModuleOrder, ProductLedger};
use stationplan_core::production::ProductionSettings;
use stationplan_core::shortfall::{AutoAdd, AutoAddOutcome};
use stationplan_core::station::Station;
use stationplan_core::test_utils::*;

// ===========================================================================
// Generators
// ===========================================================================

const MODULES: [(&str, &str); 6] = [
    ("prod_energycells", "default"),
    ("prod_refinedmetals", "default"),
    ("prod_solarcells", "default"),
    ("prod_hullparts", "default"),
    ("prod_hullparts", "teladi"),
    ("hab_argon_s", "default"),
];

fn arb_orders(max: usize) -> impl Strategy<Value = Vec<(usize, u32)>> {
    proptest::collection::vec((0..MODULES.len(), 1..20u32), 1..=max)
}

fn arb_settings() -> impl Strategy<Value = ProductionSettings> {
    (0..=4u32, 0..=300u32)
        .prop_map(|(w, s)| ProductionSettings::new(w as f64 * 0.25, s as f64))
}

fn to_orders(catalog: &Catalog, picks: &[(usize, u32)]) -> Vec<ModuleOrder> {
    picks
        .iter()
        .map(|&(i, count)| {
            let (module, method) = MODULES[i];
            order(catalog, module, count).with_method(method)
        })
        .collect()
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Placing the same orders in reverse yields the same ledger.
    #[test]
    fn placement_order_does_not_matter(picks in arb_orders(12), settings in arb_settings()) {
        let catalog = sample_catalog();
        let orders = to_orders(&catalog, &picks);

        let mut forward = ProductLedger::new();
        for o in &orders {
            forward.add_modules(&catalog, &settings, std::slice::from_ref(o)).unwrap();
        }
        let mut reversed = ProductLedger::new();
        for o in orders.iter().rev() {
            reversed.add_modules(&catalog, &settings, std::slice::from_ref(o)).unwrap();
        }
        let mut batched = ProductLedger::new();
        batched.add_modules(&catalog, &settings, &orders).unwrap();

        prop_assert_eq!(&forward, &reversed);
        prop_assert_eq!(&forward, &batched);
    }

    /// Every entry's net equals the sum of its details, and no entry is
    /// left without details.
    #[test]
    fn net_is_sum_of_details(picks in arb_orders(12), settings in arb_settings()) {
        let catalog = sample_catalog();
        let mut ledger = ProductLedger::new();
        ledger.add_modules(&catalog, &settings, &to_orders(&catalog, &picks)).unwrap();

        for entry in ledger.entries() {
            prop_assert!(!entry.details().is_empty());
            let sum = entry
                .details()
                .iter()
                .fold(Fixed64::ZERO, |acc, d| acc + d.amount());
            prop_assert_eq!(entry.net(), sum);
            prop_assert_eq!(entry.net(), entry.produced() + entry.consumed());
        }
    }

    /// Partial removals interleaved with adds in any order end at the same
    /// ledger as placing only what is left.
    #[test]
    fn interleaved_removals_do_not_matter(
        picks in proptest::collection::vec((0..MODULES.len(), 1..20u32, 0..20u32), 1..=10),
        settings in arb_settings(),
    ) {
        let catalog = sample_catalog();
        let added: Vec<(usize, u32)> = picks.iter().map(|&(i, c, _)| (i, c)).collect();
        let removed: Vec<(usize, u32)> = picks.iter().map(|&(i, c, r)| (i, r.min(c))).collect();
        let kept: Vec<(usize, u32)> = picks.iter().map(|&(i, c, r)| (i, c - r.min(c))).collect();
        let added = to_orders(&catalog, &added);
        let removed = to_orders(&catalog, &removed);

        // All adds, then all removals.
        let mut adds_first = ProductLedger::new();
        for o in &added {
            adds_first.add_modules(&catalog, &settings, std::slice::from_ref(o)).unwrap();
        }
        for o in &removed {
            adds_first.remove_modules(&catalog, &settings, std::slice::from_ref(o)).unwrap();
        }

        // Each removal right after its add, walking the picks backwards.
        let mut interleaved = ProductLedger::new();
        for (a, r) in added.iter().zip(&removed).rev() {
            interleaved.add_modules(&catalog, &settings, std::slice::from_ref(a)).unwrap();
            interleaved.remove_modules(&catalog, &settings, std::slice::from_ref(r)).unwrap();
        }

        let mut direct = ProductLedger::new();
        direct.add_modules(&catalog, &settings, &to_orders(&catalog, &kept)).unwrap();

        prop_assert_eq!(adds_first.totals(), interleaved.totals());
        prop_assert_eq!(adds_first.totals(), direct.totals());
        prop_assert_eq!(&adds_first, &direct);
    }

    /// Removing everything that was added leaves an empty ledger.
    #[test]
    fn add_then_remove_is_empty(picks in arb_orders(12), settings in arb_settings()) {
        let catalog = sample_catalog();
        let orders = to_orders(&catalog, &picks);
        let mut ledger = ProductLedger::new();
        ledger.add_modules(&catalog, &settings, &orders).unwrap();
        ledger.remove_modules(&catalog, &settings, &orders).unwrap();
        prop_assert!(ledger.is_empty());
    }

    /// A settings change gives the same ledger as placing under the new
    /// settings from the start.
    #[test]
    fn settings_change_matches_fresh_station(
        picks in arb_orders(8),
        before in arb_settings(),
        after in arb_settings(),
    ) {
        let catalog = Arc::new(sample_catalog());
        let orders = to_orders(&catalog, &picks);

        let mut changed = Station::new(Arc::clone(&catalog), before);
        changed.place_modules(&orders).unwrap();
        changed.set_settings(after);

        let mut fresh = Station::new(Arc::clone(&catalog), after);
        fresh.place_modules(&orders).unwrap();

        prop_assert_eq!(changed.ledger(), fresh.ledger());
    }

    /// Auto-add on a linear chain converges with every manufactured ware
    /// covered, one tier per pass.
    #[test]
    fn auto_add_covers_chain(depth in 1..=6u32, count in 1..=20u32) {
        let catalog = Arc::new(chain_catalog(depth));
        let mut station = Station::new(Arc::clone(&catalog), ProductionSettings::new(0.0, 100.0));
        let top = order(&catalog, &format!("prod_t{depth}"), count);
        station.place_modules(&[top]).unwrap();

        let report = AutoAdd::new(&AutoAddConfig::default()).run(&mut station).unwrap();
        prop_assert_eq!(report.outcome, Some(AutoAddOutcome::Converged));
        prop_assert_eq!(report.passes, depth);
        for (ware, _) in station.ledger().shortages() {
            prop_assert_eq!(catalog.tier(ware), 0);
        }
    }
}
