//! Catalog entity shapes.
//!
//! Every tradeable entity is a [`Ware`]. Modules, equipment and ships carry
//! their extra data in a [`WareKind`] payload, so capability checks are plain
//! pattern matches.

use crate::fixed::Fixed64;
use crate::id::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The production method every produced ware must provide.
pub const DEFAULT_METHOD: &str = "default";

/// Tag sets are ordered so iteration and debug output are stable.
pub type TagSet = BTreeSet<String>;

/// Build a [`TagSet`] from string slices.
pub fn tag_set<'a>(tags: impl IntoIterator<Item = &'a str>) -> TagSet {
    tags.into_iter().map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// Lookup tables
// ---------------------------------------------------------------------------

/// A ware group. Tier 0 is raw, anything above is manufactured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WareGroup {
    pub name: String,
    pub tier: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Race {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faction {
    pub name: String,
    pub race: Option<RaceId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Size {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentType {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Wares
// ---------------------------------------------------------------------------

/// Price range of a ware in credits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

/// A tradeable entity. Immutable once the catalog is built.
#[derive(Debug, Clone)]
pub struct Ware {
    pub id: WareId,
    /// Game data identifier, e.g. `"energycells"`.
    pub name: String,
    pub display_name: String,
    pub group: Option<GroupId>,
    /// Copied from the group when the catalog is built. Wares without a
    /// group are tier 0.
    pub tier: u32,
    pub transport: Option<TransportTypeId>,
    pub price: PriceRange,
    pub tags: TagSet,
    pub kind: WareKind,
}

impl Ware {
    pub fn as_module(&self) -> Option<&ModuleSpec> {
        match &self.kind {
            WareKind::Module(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_equipment(&self) -> Option<&EquipmentSpec> {
        match &self.kind {
            WareKind::Equipment(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_ship(&self) -> Option<&ShipSpec> {
        match &self.kind {
            WareKind::Ship(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_thruster(&self) -> bool {
        matches!(
            &self.kind,
            WareKind::Equipment(EquipmentSpec {
                kind: EquipmentKind::Thruster(_),
                ..
            })
        )
    }
}

/// Kind-specific payload of a ware.
#[derive(Debug, Clone, Default)]
pub enum WareKind {
    #[default]
    Plain,
    Module(ModuleSpec),
    Equipment(EquipmentSpec),
    Ship(ShipSpec),
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleType {
    Production,
    Habitation,
    Storage,
    Defence,
    Dock,
    Connection,
    Other(String),
}

impl ModuleType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "production" => ModuleType::Production,
            "habitation" => ModuleType::Habitation,
            "storage" => ModuleType::Storage,
            "defence" | "defense" => ModuleType::Defence,
            "dock" | "dockarea" => ModuleType::Dock,
            "connection" | "connectionmodule" => ModuleType::Connection,
            other => ModuleType::Other(other.to_string()),
        }
    }
}

/// One ware a module can produce, under a given method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProduction {
    pub ware: WareId,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSpec {
    pub transport: Option<TransportTypeId>,
    pub capacity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Turret,
    Shield,
}

/// Number of turret or shield mounts of one size on a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCount {
    pub kind: SlotKind,
    pub size: SizeId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub module_type: ModuleType,
    /// Workers required by production modules, or housed by habitation
    /// modules.
    pub workforce: u32,
    pub productions: Vec<ModuleProduction>,
    pub storage: Option<StorageSpec>,
    pub slots: Vec<SlotCount>,
}

impl ModuleSpec {
    /// The production entry used for `method`: an exact method match, else
    /// the default method, else the first listed production.
    pub fn production_for(&self, method: &str) -> Option<&ModuleProduction> {
        self.productions
            .iter()
            .find(|p| p.method == method)
            .or_else(|| self.productions.iter().find(|p| p.method == DEFAULT_METHOD))
            .or_else(|| self.productions.first())
    }
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThrusterStats {
    pub strafe: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShieldStats {
    pub capacity: f64,
    pub recharge_rate: f64,
    pub recharge_delay: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineStats {
    pub forward_thrust: f64,
    pub reverse_thrust: f64,
    pub boost_factor: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurretStats {
    pub rotation_speed: f64,
    pub hull: f64,
}

/// Kind-specific equipment data.
#[derive(Debug, Clone, PartialEq)]
pub enum EquipmentKind {
    Thruster(ThrusterStats),
    Shield(ShieldStats),
    Engine(EngineStats),
    Turret(TurretStats),
    Weapon,
    Software,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentSpec {
    pub equipment_type: EquipmentTypeId,
    pub size: Option<SizeId>,
    pub factions: Vec<FactionId>,
    pub kind: EquipmentKind,
}

// ---------------------------------------------------------------------------
// Ships
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hangar {
    pub size: SizeId,
    pub capacity: u32,
}

/// One default assignment of a ship loadout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadoutEntry {
    pub connection: String,
    pub equipment: WareId,
}

/// A named, ordered default equipment assignment for a ship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loadout {
    pub name: String,
    pub entries: Vec<LoadoutEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipSpec {
    pub ship_type: String,
    pub size: Option<SizeId>,
    pub hull: u32,
    pub crew: u32,
    pub hangars: Vec<Hangar>,
    pub loadouts: Vec<Loadout>,
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// A named mounting point on a module or ship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentSlot {
    pub owner: WareId,
    pub connection: String,
    pub equipment_type: EquipmentTypeId,
    pub tags: TagSet,
    pub group: Option<String>,
}

// ---------------------------------------------------------------------------
// Recipes and effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRecipe {
    pub ware: WareId,
    pub method: String,
    pub amount: u32,
    pub cycle_time_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequirement {
    pub ware: WareId,
    pub method: String,
    pub needed: WareId,
    pub amount: u32,
}

/// A named production multiplier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Work,
    Sunlight,
    Other(String),
}

impl EffectKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "work" => EffectKind::Work,
            "sunlight" => EffectKind::Sunlight,
            other => EffectKind::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EffectKind::Work => "work",
            EffectKind::Sunlight => "sunlight",
            EffectKind::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub ware: WareId,
    pub method: String,
    pub kind: EffectKind,
    /// Maximum magnitude of the effect (e.g. 0.43 for a full workforce).
    pub product: Fixed64,
}
