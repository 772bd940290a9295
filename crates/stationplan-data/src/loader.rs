//! Resolution pipeline: reads the tables of a data directory, resolves the
//! names they use to catalog ids and fills a [`CatalogBuilder`].
//!
//! Tables are read in dependency order (lookups, wares, production,
//! modules, equipment, ships, connections) so every name a row mentions is
//! registered before the row is read.

use serde::de::DeserializeOwned;
use stationplan_core::catalog::{Catalog, CatalogBuilder, CatalogError, CatalogSource, WareDef};
use stationplan_core::config::PlannerConfig;
use stationplan_core::entity::*;
use stationplan_core::fixed::f64_to_fixed64;
use stationplan_core::id::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::files::DataFile;
use crate::schema::*;

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("table '{table}' is required but {dir} has no file for it")]
    MissingTable { table: &'static str, dir: PathBuf },

    #[error("{path}: not a .ron, .json or .toml file")]
    UnknownExtension { path: PathBuf },

    #[error("table stored twice: {first} and {second}")]
    AmbiguousTable { first: PathBuf, second: PathBuf },

    #[error("{path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A row names something no earlier table registered.
    #[error("{file}: unknown {kind} '{name}'")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        kind: &'static str,
    },

    #[error("{file}: '{name}' is defined more than once")]
    DuplicateName { file: PathBuf, name: String },

    /// The rows were read but do not form a valid catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Tables
// ===========================================================================

/// The rows of one table and the file they came from, for error reports.
struct Table<T> {
    file: PathBuf,
    rows: Vec<T>,
}

impl<T: DeserializeOwned> Table<T> {
    fn required(dir: &Path, name: &'static str) -> Result<Self, DataLoadError> {
        let file = DataFile::locate(dir, name)?.ok_or_else(|| DataLoadError::MissingTable {
            table: name,
            dir: dir.to_path_buf(),
        })?;
        Self::read(&file, name)
    }

    /// A table without a file reads as empty.
    fn optional(dir: &Path, name: &str) -> Result<Self, DataLoadError> {
        match DataFile::locate(dir, name)? {
            Some(file) => Self::read(&file, name),
            None => Ok(Table {
                file: dir.join(name),
                rows: Vec::new(),
            }),
        }
    }

    fn read(file: &DataFile, name: &str) -> Result<Self, DataLoadError> {
        Ok(Table {
            file: file.path().to_path_buf(),
            rows: file.parse_rows(name)?,
        })
    }
}

impl<T> Table<T> {
    fn resolve<V: Copy>(
        &self,
        names: &HashMap<String, V>,
        name: &str,
        kind: &'static str,
    ) -> Result<V, DataLoadError> {
        names
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                file: self.file.clone(),
                name: name.to_string(),
                kind,
            })
    }

    fn resolve_opt<V: Copy>(
        &self,
        names: &HashMap<String, V>,
        name: Option<&str>,
        kind: &'static str,
    ) -> Result<Option<V>, DataLoadError> {
        name.map(|n| self.resolve(names, n, kind)).transpose()
    }

    fn ensure_new<V>(&self, names: &HashMap<String, V>, name: &str) -> Result<(), DataLoadError> {
        if names.contains_key(name) {
            return Err(DataLoadError::DuplicateName {
                file: self.file.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// A directory of game data files.
///
/// Required: `wares`, `ware_groups`, `ware_productions`. Optional:
/// `transport_types`, `ware_resources`, `ware_effects`, `modules`,
/// `equipment`, `equipment_types`, `factions`, `races`, `sizes`,
/// `connections`, `ships`, `ship_loadouts`, `ship_hangers`.
#[derive(Debug, Clone)]
pub struct DataDir {
    dir: PathBuf,
}

impl DataDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl CatalogSource for DataDir {
    type Error = DataLoadError;

    fn populate(&self, b: &mut CatalogBuilder) -> Result<(), DataLoadError> {
        let dir = self.dir.as_path();
        load_lookups(dir, b)?;
        load_wares(dir, b)?;
        load_production(dir, b)?;
        load_modules(dir, b)?;
        load_equipment(dir, b)?;
        load_ships(dir, b)?;
        load_connections(dir, b)?;
        Ok(())
    }
}

/// Load and build the catalog in `dir`.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    let catalog = Catalog::load(&DataDir::new(dir))?;
    tracing::debug!(
        dir = %dir.display(),
        wares = catalog.ware_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Load `planner.{ron,toml,json}` from `dir`, or the defaults if absent.
pub fn load_planner_config(dir: &Path) -> Result<PlannerConfig, DataLoadError> {
    match DataFile::locate(dir, "planner")? {
        Some(file) => {
            let config = file.parse()?;
            tracing::debug!(file = %file.path().display(), "planner config loaded");
            Ok(config)
        }
        None => Ok(PlannerConfig::default()),
    }
}

fn load_lookups(dir: &Path, b: &mut CatalogBuilder) -> Result<(), DataLoadError> {
    let transports: Table<NameData> = Table::optional(dir, "transport_types")?;
    for row in &transports.rows {
        transports.ensure_new(b.transport_names(), &row.name)?;
        b.register_transport(&row.name)?;
    }

    let races: Table<NameData> = Table::optional(dir, "races")?;
    for row in &races.rows {
        races.ensure_new(b.race_names(), &row.name)?;
        b.register_race(&row.name)?;
    }

    let factions: Table<FactionData> = Table::optional(dir, "factions")?;
    for row in &factions.rows {
        factions.ensure_new(b.faction_names(), &row.name)?;
        let race = factions.resolve_opt(b.race_names(), row.race.as_deref(), "race")?;
        b.register_faction(&row.name, race)?;
    }

    let sizes: Table<NameData> = Table::optional(dir, "sizes")?;
    for row in &sizes.rows {
        sizes.ensure_new(b.size_names(), &row.name)?;
        b.register_size(&row.name)?;
    }

    let types: Table<NameData> = Table::optional(dir, "equipment_types")?;
    for row in &types.rows {
        types.ensure_new(b.equipment_type_names(), &row.name)?;
        b.register_equipment_type(&row.name)?;
    }

    let groups: Table<GroupData> = Table::required(dir, "ware_groups")?;
    for row in &groups.rows {
        groups.ensure_new(b.group_names(), &row.name)?;
        b.register_group(&row.name, row.tier)?;
    }
    Ok(())
}

fn load_wares(dir: &Path, b: &mut CatalogBuilder) -> Result<(), DataLoadError> {
    let wares: Table<WareData> = Table::required(dir, "wares")?;
    for row in &wares.rows {
        wares.ensure_new(b.ware_names(), &row.name)?;
        let group = wares.resolve_opt(b.group_names(), row.group.as_deref(), "ware group")?;
        let transport =
            wares.resolve_opt(b.transport_names(), row.transport.as_deref(), "transport type")?;
        b.register_ware(WareDef {
            name: row.name.clone(),
            display_name: row.display_name.clone().unwrap_or_else(|| row.name.clone()),
            group,
            transport,
            price: PriceRange {
                min: row.price_min,
                max: row.price_max,
            },
            tags: tag_set(row.tags.iter().map(String::as_str)),
        })?;
    }
    Ok(())
}

fn load_production(dir: &Path, b: &mut CatalogBuilder) -> Result<(), DataLoadError> {
    let recipes: Table<ProductionData> = Table::required(dir, "ware_productions")?;
    for row in &recipes.rows {
        let ware = recipes.resolve(b.ware_names(), &row.ware, "ware")?;
        b.add_recipe(ProductionRecipe {
            ware,
            method: row.method.clone(),
            amount: row.amount,
            cycle_time_secs: row.time,
        });
    }

    let resources: Table<ResourceData> = Table::optional(dir, "ware_resources")?;
    for row in &resources.rows {
        let ware = resources.resolve(b.ware_names(), &row.ware, "ware")?;
        let needed = resources.resolve(b.ware_names(), &row.needed, "ware")?;
        b.add_requirement(ResourceRequirement {
            ware,
            method: row.method.clone(),
            needed,
            amount: row.amount,
        });
    }

    let effects: Table<EffectData> = Table::optional(dir, "ware_effects")?;
    for row in &effects.rows {
        let ware = effects.resolve(b.ware_names(), &row.ware, "ware")?;
        b.add_effect(Effect {
            ware,
            method: row.method.clone(),
            kind: EffectKind::from_name(&row.effect),
            product: f64_to_fixed64(row.product),
        });
    }
    Ok(())
}

fn load_modules(dir: &Path, b: &mut CatalogBuilder) -> Result<(), DataLoadError> {
    let modules: Table<ModuleData> = Table::optional(dir, "modules")?;
    for row in &modules.rows {
        let id = modules.resolve(b.ware_names(), &row.name, "ware")?;
        let productions = row
            .productions
            .iter()
            .map(|p| {
                Ok(ModuleProduction {
                    ware: modules.resolve(b.ware_names(), &p.ware, "ware")?,
                    method: p.method.clone(),
                })
            })
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        let storage = match &row.storage {
            Some(s) => Some(StorageSpec {
                transport: modules.resolve_opt(
                    b.transport_names(),
                    s.transport.as_deref(),
                    "transport type",
                )?,
                capacity: s.capacity,
            }),
            None => None,
        };
        let slots = row
            .slots
            .iter()
            .map(|s| {
                Ok(SlotCount {
                    kind: match s.kind {
                        SlotKindData::Turret => SlotKind::Turret,
                        SlotKindData::Shield => SlotKind::Shield,
                    },
                    size: modules.resolve(b.size_names(), &s.size, "size")?,
                    count: s.count,
                })
            })
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        b.set_kind(
            id,
            WareKind::Module(ModuleSpec {
                module_type: ModuleType::from_name(&row.module_type),
                workforce: row.workforce,
                productions,
                storage,
                slots,
            }),
        )?;
    }
    Ok(())
}

fn load_equipment(dir: &Path, b: &mut CatalogBuilder) -> Result<(), DataLoadError> {
    let equipment: Table<EquipmentData> = Table::optional(dir, "equipment")?;
    for row in &equipment.rows {
        let id = equipment.resolve(b.ware_names(), &row.name, "ware")?;
        let equipment_type =
            equipment.resolve(b.equipment_type_names(), &row.equipment_type, "equipment type")?;
        let size = equipment.resolve_opt(b.size_names(), row.size.as_deref(), "size")?;
        let factions = row
            .factions
            .iter()
            .map(|f| equipment.resolve(b.faction_names(), f, "faction"))
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        b.set_kind(
            id,
            WareKind::Equipment(EquipmentSpec {
                equipment_type,
                size,
                factions,
                kind: equipment_kind(&row.kind),
            }),
        )?;
    }
    Ok(())
}

fn equipment_kind(data: &EquipmentKindData) -> EquipmentKind {
    match *data {
        EquipmentKindData::Thruster {
            strafe,
            pitch,
            yaw,
            roll,
        } => EquipmentKind::Thruster(ThrusterStats {
            strafe,
            pitch,
            yaw,
            roll,
        }),
        EquipmentKindData::Shield {
            capacity,
            recharge_rate,
            recharge_delay,
        } => EquipmentKind::Shield(ShieldStats {
            capacity,
            recharge_rate,
            recharge_delay,
        }),
        EquipmentKindData::Engine {
            forward_thrust,
            reverse_thrust,
            boost_factor,
        } => EquipmentKind::Engine(EngineStats {
            forward_thrust,
            reverse_thrust,
            boost_factor,
        }),
        EquipmentKindData::Turret {
            rotation_speed,
            hull,
        } => EquipmentKind::Turret(TurretStats {
            rotation_speed,
            hull,
        }),
        EquipmentKindData::Weapon => EquipmentKind::Weapon,
        EquipmentKindData::Software => EquipmentKind::Software,
        EquipmentKindData::Other => EquipmentKind::Other,
    }
}

/// Ships, with their hangars and default loadouts attached.
fn load_ships(dir: &Path, b: &mut CatalogBuilder) -> Result<(), DataLoadError> {
    let ships: Table<ShipData> = Table::optional(dir, "ships")?;
    let mut specs: Vec<(WareId, ShipSpec)> = Vec::with_capacity(ships.rows.len());
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for row in &ships.rows {
        ships.ensure_new(&by_name, &row.name)?;
        let id = ships.resolve(b.ware_names(), &row.name, "ware")?;
        let size = ships.resolve_opt(b.size_names(), row.size.as_deref(), "size")?;
        by_name.insert(row.name.clone(), specs.len());
        specs.push((
            id,
            ShipSpec {
                ship_type: row.ship_type.clone(),
                size,
                hull: row.hull,
                crew: row.crew,
                hangars: Vec::new(),
                loadouts: Vec::new(),
            },
        ));
    }

    let hangars: Table<HangarData> = Table::optional(dir, "ship_hangers")?;
    for row in &hangars.rows {
        let index = hangars.resolve(&by_name, &row.ship, "ship")?;
        let size = hangars.resolve(b.size_names(), &row.size, "size")?;
        specs[index].1.hangars.push(Hangar {
            size,
            capacity: row.capacity,
        });
    }

    let loadouts: Table<LoadoutData> = Table::optional(dir, "ship_loadouts")?;
    for row in &loadouts.rows {
        let index = loadouts.resolve(&by_name, &row.ship, "ship")?;
        let equipment = loadouts.resolve(b.ware_names(), &row.equipment, "ware")?;
        let entry = LoadoutEntry {
            connection: row.connection.clone(),
            equipment,
        };
        let ship = &mut specs[index].1;
        match ship.loadouts.iter_mut().find(|l| l.name == row.loadout) {
            Some(loadout) => loadout.entries.push(entry),
            None => ship.loadouts.push(Loadout {
                name: row.loadout.clone(),
                entries: vec![entry],
            }),
        }
    }

    for (id, spec) in specs {
        b.set_kind(id, WareKind::Ship(spec))?;
    }
    Ok(())
}

fn load_connections(dir: &Path, b: &mut CatalogBuilder) -> Result<(), DataLoadError> {
    let connections: Table<ConnectionData> = Table::optional(dir, "connections")?;
    for row in &connections.rows {
        let owner = connections.resolve(b.ware_names(), &row.owner, "ware")?;
        let equipment_type =
            connections.resolve(b.equipment_type_names(), &row.equipment_type, "equipment type")?;
        b.add_connection(EquipmentSlot {
            owner,
            connection: row.connection.clone(),
            equipment_type,
            tags: tag_set(row.tags.iter().map(String::as_str)),
            group: row.group.clone(),
        });
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "stationplan_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    /// The minimum required tables: ore and energycells.
    fn write_minimal(dir: &Path) {
        fs::write(
            dir.join("ware_groups.ron"),
            r#"[(name: "minerals", tier: 0), (name: "energy", tier: 1)]"#,
        )
        .unwrap();
        fs::write(
            dir.join("wares.json"),
            r#"[
                {"name": "ore", "group": "minerals", "price_min": 40, "price_max": 60},
                {"name": "energycells", "group": "energy"},
                {"name": "prod_energycells"}
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.join("ware_productions.toml"),
            r#"
[[ware_productions]]
ware = "energycells"
amount = 10
time = 3600
"#,
        )
        .unwrap();
        fs::write(
            dir.join("ware_resources.ron"),
            r#"[(ware: "energycells", needed: "ore", amount: 2)]"#,
        )
        .unwrap();
        fs::write(
            dir.join("modules.ron"),
            r#"[(name: "prod_energycells", productions: [(ware: "energycells")])]"#,
        )
        .unwrap();
    }

    // -----------------------------------------------------------------------
    // Table
    // -----------------------------------------------------------------------

    fn table(file: &str) -> Table<WareData> {
        Table {
            file: PathBuf::from(file),
            rows: Vec::new(),
        }
    }

    #[test]
    fn required_table_must_exist() {
        let dir = make_test_dir("required");
        let result: Result<Table<WareData>, _> = Table::required(&dir, "wares");
        assert!(matches!(
            result,
            Err(DataLoadError::MissingTable { table: "wares", .. })
        ));

        let empty: Table<WareData> = Table::optional(&dir, "wares").unwrap();
        assert!(empty.rows.is_empty());
        cleanup(&dir);
    }

    #[test]
    fn resolve_reports_file_and_kind() {
        let names: HashMap<String, u32> = HashMap::from([("ore".to_string(), 7)]);
        let t = table("modules.ron");

        assert_eq!(t.resolve(&names, "ore", "ware").unwrap(), 7);
        assert_eq!(t.resolve_opt(&names, None, "ware").unwrap(), None);
        match t.resolve(&names, "silicon", "ware") {
            Err(DataLoadError::UnresolvedRef { file, name, kind }) => {
                assert_eq!(file, PathBuf::from("modules.ron"));
                assert_eq!(name, "silicon");
                assert_eq!(kind, "ware");
            }
            other => panic!("expected UnresolvedRef, got {other:?}"),
        }
    }

    #[test]
    fn ensure_new_rejects_known_names() {
        let names: HashMap<String, u32> = HashMap::from([("ore".to_string(), 7)]);
        let t = table("wares.ron");
        assert!(t.ensure_new(&names, "silicon").is_ok());
        assert!(matches!(
            t.ensure_new(&names, "ore"),
            Err(DataLoadError::DuplicateName { ref name, .. }) if name == "ore"
        ));
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    #[test]
    fn minimal_directory_loads() {
        let dir = make_test_dir("minimal");
        write_minimal(&dir);

        let catalog = load_catalog(&dir).unwrap();
        let ore = catalog.get("ore").unwrap();
        assert_eq!(ore.tier, 0);
        assert_eq!(ore.price, PriceRange { min: 40, max: 60 });
        let energy = catalog.ware_id("energycells").unwrap();
        assert_eq!(catalog.tier(energy), 1);
        assert_eq!(catalog.requirements(energy).len(), 1);
        assert_eq!(catalog.producers_of(energy).len(), 1);

        cleanup(&dir);
    }

    #[test]
    fn missing_required_table_fails() {
        let dir = make_test_dir("missing_table");
        write_minimal(&dir);
        fs::remove_file(dir.join("ware_productions.toml")).unwrap();

        assert!(matches!(
            load_catalog(&dir),
            Err(DataLoadError::MissingTable {
                table: "ware_productions",
                ..
            })
        ));

        cleanup(&dir);
    }

    #[test]
    fn unresolved_reference_names_the_file() {
        let dir = make_test_dir("unresolved");
        write_minimal(&dir);
        fs::write(
            dir.join("ware_resources.ron"),
            r#"[(ware: "energycells", needed: "unobtainium", amount: 2)]"#,
        )
        .unwrap();

        match load_catalog(&dir) {
            Err(DataLoadError::UnresolvedRef { file, name, .. }) => {
                assert_eq!(name, "unobtainium");
                assert!(file.ends_with("ware_resources.ron"));
            }
            other => panic!("expected UnresolvedRef, got {other:?}"),
        }

        cleanup(&dir);
    }

    #[test]
    fn duplicate_ware_is_rejected() {
        let dir = make_test_dir("duplicate");
        write_minimal(&dir);
        fs::write(
            dir.join("wares.json"),
            r#"[{"name": "ore"}, {"name": "ore"}]"#,
        )
        .unwrap();

        assert!(matches!(
            load_catalog(&dir),
            Err(DataLoadError::DuplicateName { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn module_without_default_recipe_is_a_catalog_error() {
        let dir = make_test_dir("no_default");
        write_minimal(&dir);
        fs::write(
            dir.join("ware_productions.toml"),
            r#"
[[ware_productions]]
ware = "energycells"
method = "teladi"
amount = 10
time = 3600
"#,
        )
        .unwrap();

        assert!(matches!(
            load_catalog(&dir),
            Err(DataLoadError::Catalog(CatalogError::MissingDefaultRecipe { .. }))
        ));

        cleanup(&dir);
    }

    #[test]
    fn planner_config_defaults_when_absent() {
        let dir = make_test_dir("planner_default");
        assert_eq!(load_planner_config(&dir).unwrap(), PlannerConfig::default());

        fs::write(
            dir.join("planner.toml"),
            r#"
[settings]
workforce_ratio = 0.5

[auto_add]
max_passes = 10
"#,
        )
        .unwrap();
        let config = load_planner_config(&dir).unwrap();
        assert_eq!(config.settings.workforce_ratio, 0.5);
        assert_eq!(config.settings.sunlight, 100.0);
        assert_eq!(config.auto_add.max_passes, 10);

        cleanup(&dir);
    }

    #[test]
    fn error_display_messages() {
        let e = DataLoadError::MissingTable {
            table: "wares",
            dir: PathBuf::from("/data"),
        };
        assert!(format!("{e}").contains("wares"));
        assert!(format!("{e}").contains("/data"));

        let e = DataLoadError::UnresolvedRef {
            file: PathBuf::from("modules.ron"),
            name: "ore".to_string(),
            kind: "ware",
        };
        let msg = format!("{e}");
        assert!(msg.contains("ore"));
        assert!(msg.contains("modules.ron"));

        let e: DataLoadError = CatalogError::EntityNotFound("ore".to_string()).into();
        assert!(format!("{e}").contains("ore"));
    }
}
