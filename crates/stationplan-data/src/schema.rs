//! Serde data file structs for game content.
//!
//! One struct per table of the exported game data. Rows refer to each other
//! by name; the loader resolves names to catalog ids. Every file holds a
//! list of rows; TOML files wrap the list in a top-level key named after the
//! file (`[[wares]]`, `[[ware_groups]]`, ...).

use serde::Deserialize;

fn default_method() -> String {
    "default".to_string()
}

// ===========================================================================
// Lookup tables
// ===========================================================================

/// A row of `ware_groups`.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupData {
    pub name: String,
    #[serde(default)]
    pub tier: u32,
}

/// A row of `transport_types`, `races`, `sizes` or `equipment_types`.
#[derive(Debug, Clone, Deserialize)]
pub struct NameData {
    pub name: String,
}

/// A row of `factions`.
#[derive(Debug, Clone, Deserialize)]
pub struct FactionData {
    pub name: String,
    #[serde(default)]
    pub race: Option<String>,
}

// ===========================================================================
// Wares and production
// ===========================================================================

/// A row of `wares`. Modules, equipment and ships are wares too; their
/// extra data lives in `modules`, `equipment` and `ships`.
#[derive(Debug, Clone, Deserialize)]
pub struct WareData {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default)]
    pub price_min: u64,
    #[serde(default)]
    pub price_max: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A row of `ware_productions`: one recipe of one ware.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductionData {
    pub ware: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub amount: u32,
    /// Cycle time in seconds.
    pub time: u32,
}

/// A row of `ware_resources`: one input of one recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    pub ware: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub needed: String,
    pub amount: u32,
}

/// A row of `ware_effects`.
#[derive(Debug, Clone, Deserialize)]
pub struct EffectData {
    pub ware: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub effect: String,
    pub product: f64,
}

// ===========================================================================
// Modules
// ===========================================================================

/// A row of `modules`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleData {
    pub name: String,
    #[serde(rename = "type", default = "default_module_type")]
    pub module_type: String,
    #[serde(default)]
    pub workforce: u32,
    #[serde(default)]
    pub productions: Vec<ModuleProductionData>,
    #[serde(default)]
    pub storage: Option<StorageData>,
    #[serde(default)]
    pub slots: Vec<SlotData>,
}

fn default_module_type() -> String {
    "production".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleProductionData {
    pub ware: String,
    #[serde(default = "default_method")]
    pub method: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageData {
    #[serde(default)]
    pub transport: Option<String>,
    pub capacity: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKindData {
    Turret,
    Shield,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotData {
    pub kind: SlotKindData,
    pub size: String,
    pub count: u32,
}

// ===========================================================================
// Equipment
// ===========================================================================

/// A row of `equipment`.
#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentData {
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub factions: Vec<String>,
    #[serde(default)]
    pub kind: EquipmentKindData,
}

/// Kind-specific equipment fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub enum EquipmentKindData {
    Thruster {
        #[serde(default)]
        strafe: f64,
        #[serde(default)]
        pitch: f64,
        #[serde(default)]
        yaw: f64,
        #[serde(default)]
        roll: f64,
    },
    Shield {
        #[serde(default)]
        capacity: f64,
        #[serde(default)]
        recharge_rate: f64,
        #[serde(default)]
        recharge_delay: f64,
    },
    Engine {
        #[serde(default)]
        forward_thrust: f64,
        #[serde(default)]
        reverse_thrust: f64,
        #[serde(default)]
        boost_factor: f64,
    },
    Turret {
        #[serde(default)]
        rotation_speed: f64,
        #[serde(default)]
        hull: f64,
    },
    Weapon,
    Software,
    #[default]
    Other,
}

// ===========================================================================
// Connections
// ===========================================================================

/// A row of `connections`: a named mounting point of a module or ship.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionData {
    pub owner: String,
    pub connection: String,
    pub equipment_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub group: Option<String>,
}

// ===========================================================================
// Ships
// ===========================================================================

/// A row of `ships`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShipData {
    pub name: String,
    #[serde(default)]
    pub ship_type: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub hull: u32,
    #[serde(default)]
    pub crew: u32,
}

/// A row of `ship_loadouts`: one entry of a named default loadout.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadoutData {
    pub ship: String,
    #[serde(default = "default_method")]
    pub loadout: String,
    pub connection: String,
    pub equipment: String,
}

/// A row of `ship_hangers`.
#[derive(Debug, Clone, Deserialize)]
pub struct HangarData {
    pub ship: String,
    pub size: String,
    pub capacity: u32,
}
