//! Shared test fixtures for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::{Catalog, CatalogBuilder, WareDef};
use crate::entity::*;
use crate::fixed::Fixed64;
use crate::id::*;
use crate::production::ProductionSettings;
use crate::station::{ModuleOrder, Station};
use std::sync::Arc;

// ===========================================================================
// Builder helpers
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn plain_ware(b: &mut CatalogBuilder, name: &str, group: Option<GroupId>) -> WareId {
    b.register_ware(WareDef {
        name: name.to_string(),
        group,
        ..Default::default()
    })
    .unwrap()
}

/// Register a ware with a default recipe (`amount` per `cycle` seconds)
/// and the given default-method inputs.
pub fn recipe_ware(
    b: &mut CatalogBuilder,
    name: &str,
    group: GroupId,
    amount: u32,
    cycle: u32,
    inputs: &[(WareId, u32)],
) -> WareId {
    let id = plain_ware(b, name, Some(group));
    add_recipe(b, id, DEFAULT_METHOD, amount, cycle, inputs);
    id
}

pub fn add_recipe(
    b: &mut CatalogBuilder,
    ware: WareId,
    method: &str,
    amount: u32,
    cycle: u32,
    inputs: &[(WareId, u32)],
) {
    b.add_recipe(ProductionRecipe {
        ware,
        method: method.to_string(),
        amount,
        cycle_time_secs: cycle,
    });
    for &(needed, amount) in inputs {
        b.add_requirement(ResourceRequirement {
            ware,
            method: method.to_string(),
            needed,
            amount,
        });
    }
}

pub fn add_effect(b: &mut CatalogBuilder, ware: WareId, method: &str, kind: EffectKind, product: f64) {
    b.add_effect(Effect {
        ware,
        method: method.to_string(),
        kind,
        product: fixed(product),
    });
}

/// Register a production module producing `ware` with each listed method.
pub fn production_module(
    b: &mut CatalogBuilder,
    name: &str,
    ware: WareId,
    methods: &[&str],
    workforce: u32,
) -> WareId {
    let id = plain_ware(b, name, None);
    b.set_kind(
        id,
        WareKind::Module(ModuleSpec {
            module_type: ModuleType::Production,
            workforce,
            productions: methods
                .iter()
                .map(|m| ModuleProduction {
                    ware,
                    method: m.to_string(),
                })
                .collect(),
            storage: None,
            slots: vec![],
        }),
    )
    .unwrap();
    id
}

pub fn equipment_ware(
    b: &mut CatalogBuilder,
    name: &str,
    equipment_type: EquipmentTypeId,
    tags: &[&str],
    kind: EquipmentKind,
) -> WareId {
    let id = b
        .register_ware(WareDef {
            name: name.to_string(),
            tags: tag_set(tags.iter().copied()),
            ..Default::default()
        })
        .unwrap();
    b.set_kind(
        id,
        WareKind::Equipment(EquipmentSpec {
            equipment_type,
            size: None,
            factions: vec![],
            kind,
        }),
    )
    .unwrap();
    id
}

pub fn slot(owner: WareId, connection: &str, equipment_type: EquipmentTypeId, tags: &[&str]) -> EquipmentSlot {
    EquipmentSlot {
        owner,
        connection: connection.to_string(),
        equipment_type,
        tags: tag_set(tags.iter().copied()),
        group: None,
    }
}

// ===========================================================================
// Sample catalog
// ===========================================================================

/// A small but complete catalog.
///
/// Tier 0: `ore`. Tier 1: `energycells` (10/h from 2 ore/h), `refinedmetals`
/// (20/h from 10 ore + 5 energycells), `solarcells` (100/h, sunlight).
/// Tier 2: `hullparts` (5/h from 4 refinedmetals + 2 energycells, work
/// effect 0.5; a `teladi` method makes 6/h with no own requirement rows).
/// Also a habitation module, a defence platform with shield and turret
/// connections, and a fighter with a default loadout.
pub fn sample_catalog() -> Catalog {
    sample_builder().build().unwrap()
}

pub fn sample_builder() -> CatalogBuilder {
    let mut b = CatalogBuilder::new();
    let raw = b.register_group("minerals", 0).unwrap();
    let t1 = b.register_group("refined", 1).unwrap();
    let t2 = b.register_group("hightech", 2).unwrap();
    b.register_transport("container").unwrap();
    let argon = b.register_race("argon").unwrap();
    b.register_faction("argon", Some(argon)).unwrap();
    let small = b.register_size("small").unwrap();
    let medium = b.register_size("medium").unwrap();
    b.register_size("large").unwrap();
    let shields = b.register_equipment_type("shields").unwrap();
    let turrets = b.register_equipment_type("turrets").unwrap();
    let thrusters = b.register_equipment_type("thrusters").unwrap();

    let ore = plain_ware(&mut b, "ore", Some(raw));
    let energy = recipe_ware(&mut b, "energycells", t1, 10, 3600, &[(ore, 2)]);
    let metals = recipe_ware(&mut b, "refinedmetals", t1, 20, 3600, &[(ore, 10), (energy, 5)]);
    let solar = recipe_ware(&mut b, "solarcells", t1, 100, 3600, &[]);
    add_effect(&mut b, solar, DEFAULT_METHOD, EffectKind::Sunlight, 1.0);
    let hull = recipe_ware(&mut b, "hullparts", t2, 5, 3600, &[(metals, 4), (energy, 2)]);
    add_recipe(&mut b, hull, "teladi", 6, 3600, &[]);
    add_effect(&mut b, hull, DEFAULT_METHOD, EffectKind::Work, 0.5);

    production_module(&mut b, "prod_energycells", energy, &[DEFAULT_METHOD], 0);
    production_module(&mut b, "prod_refinedmetals", metals, &[DEFAULT_METHOD], 90);
    production_module(&mut b, "prod_solarcells", solar, &[DEFAULT_METHOD], 0);
    production_module(&mut b, "prod_hullparts", hull, &[DEFAULT_METHOD, "teladi"], 150);

    let hab = plain_ware(&mut b, "hab_argon_s", None);
    b.set_kind(
        hab,
        WareKind::Module(ModuleSpec {
            module_type: ModuleType::Habitation,
            workforce: 200,
            productions: vec![],
            storage: None,
            slots: vec![],
        }),
    )
    .unwrap();

    let shield_s = equipment_ware(
        &mut b,
        "shield_s",
        shields,
        &["component", "shield", "small"],
        EquipmentKind::Shield(ShieldStats {
            capacity: 500.0,
            recharge_rate: 50.0,
            recharge_delay: 10.0,
        }),
    );
    equipment_ware(
        &mut b,
        "shield_m",
        shields,
        &["component", "shield", "medium"],
        EquipmentKind::Shield(ShieldStats::default()),
    );
    equipment_ware(
        &mut b,
        "shield_l",
        shields,
        &["component", "shield", "large"],
        EquipmentKind::Shield(ShieldStats::default()),
    );
    equipment_ware(
        &mut b,
        "turret_m",
        turrets,
        &["component", "turret", "medium"],
        EquipmentKind::Turret(TurretStats::default()),
    );
    let thruster_s = equipment_ware(
        &mut b,
        "thruster_s",
        thrusters,
        &["component", "thruster", "small"],
        EquipmentKind::Thruster(ThrusterStats::default()),
    );

    let platform = plain_ware(&mut b, "def_platform", None);
    b.set_kind(
        platform,
        WareKind::Module(ModuleSpec {
            module_type: ModuleType::Defence,
            workforce: 0,
            productions: vec![],
            storage: None,
            slots: vec![
                SlotCount {
                    kind: SlotKind::Shield,
                    size: medium,
                    count: 1,
                },
                SlotCount {
                    kind: SlotKind::Turret,
                    size: medium,
                    count: 1,
                },
            ],
        }),
    )
    .unwrap();
    b.add_connection(slot(platform, "con_shield_01", shields, &["shield", "small", "medium"]));
    b.add_connection(slot(platform, "con_turret_01", turrets, &["turret", "medium"]));

    let fighter = plain_ware(&mut b, "ship_s_fighter", None);
    b.add_connection(slot(fighter, "con_shield_01", shields, &["shield", "small"]));
    b.add_connection(slot(fighter, "con_thruster_01", thrusters, &["small"]));
    b.set_kind(
        fighter,
        WareKind::Ship(ShipSpec {
            ship_type: "fighter".to_string(),
            size: Some(small),
            hull: 3000,
            crew: 1,
            hangars: vec![],
            loadouts: vec![Loadout {
                name: "default".to_string(),
                entries: vec![
                    LoadoutEntry {
                        connection: "con_shield_01".to_string(),
                        equipment: shield_s,
                    },
                    LoadoutEntry {
                        connection: "con_thruster_01".to_string(),
                        equipment: thruster_s,
                    },
                ],
            }],
        }),
    )
    .unwrap();

    b
}

/// A linear production chain of `depth` manufactured tiers on top of one
/// raw ware. Tier `n` consumes 3 units of tier `n - 1` per cycle and
/// produces 2. Used by benchmarks and convergence properties.
pub fn chain_catalog(depth: u32) -> Catalog {
    let mut b = CatalogBuilder::new();
    let raw_group = b.register_group("tier0", 0).unwrap();
    let mut previous = plain_ware(&mut b, "raw", Some(raw_group));
    for tier in 1..=depth {
        let group = b.register_group(&format!("tier{tier}"), tier).unwrap();
        let ware = recipe_ware(&mut b, &format!("ware_t{tier}"), group, 2, 60, &[(previous, 3)]);
        production_module(&mut b, &format!("prod_t{tier}"), ware, &[DEFAULT_METHOD], 0);
        previous = ware;
    }
    b.build().unwrap()
}

// ===========================================================================
// Station helpers
// ===========================================================================

pub fn order(catalog: &Catalog, module: &str, count: u32) -> ModuleOrder {
    ModuleOrder::new(catalog.ware_id(module).unwrap(), count)
}

pub fn sample_station() -> Station {
    Station::new(Arc::new(sample_catalog()), ProductionSettings::new(0.0, 100.0))
}

pub fn net(station: &Station, ware: &str) -> Fixed64 {
    let id = station.catalog().ware_id(ware).unwrap();
    station.ledger().net(id)
}
