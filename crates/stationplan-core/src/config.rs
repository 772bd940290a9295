//! Planner configuration.
//!
//! Plain serde structs; every field has a default so a config file only
//! needs the values it changes. Reading the file is left to the data crate.

use crate::production::ProductionSettings;
use serde::{Deserialize, Serialize};

/// Passes the auto-add driver runs before giving up.
pub const DEFAULT_MAX_PASSES: u32 = 64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub settings: SettingsConfig,
    pub auto_add: AutoAddConfig,
}

/// Initial production settings of a new station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Staffed / required workers. Clamped into `[0, 1]`.
    pub workforce_ratio: f64,
    /// Sunlight in percent.
    pub sunlight: f64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            workforce_ratio: 0.0,
            sunlight: 100.0,
        }
    }
}

impl SettingsConfig {
    pub fn to_settings(&self) -> ProductionSettings {
        ProductionSettings::new(self.workforce_ratio, self.sunlight)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoAddConfig {
    pub max_passes: u32,
}

impl Default for AutoAddConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}
