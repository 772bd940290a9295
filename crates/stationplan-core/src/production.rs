//! Production formulas and efficiency.
//!
//! [`resolve_production`] turns a module and a production method into its
//! primary output and resource inputs, applying the method → `"default"`
//! fallback. [`efficiency`] computes the multiplier applied to that output
//! from the current [`ProductionSettings`].

use crate::catalog::{Catalog, CatalogError};
use crate::entity::{DEFAULT_METHOD, Effect, EffectKind, ProductionRecipe};
use crate::fixed::Fixed64;
use crate::id::WareId;
use serde::{Deserialize, Serialize};

/// Seconds per hour; all throughput is reported per hour.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, thiserror::Error)]
pub enum ProductionError {
    #[error("'{0}' is not a module")]
    NotAModule(String),
    #[error("module '{0}' does not produce anything")]
    NotAProducer(String),
    #[error("ware '{ware}' has neither a '{method}' nor a \"default\" recipe")]
    MissingDefaultRecipe { ware: String, method: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// One resource input of a production cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub ware: WareId,
    pub amount: u32,
}

/// A resolved production formula for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub module: WareId,
    pub ware: WareId,
    /// The method the module was asked to run.
    pub method: String,
    /// The method of the recipe actually used after fallback.
    pub recipe_method: String,
    pub amount: u32,
    pub cycle_time_secs: u32,
    pub requirements: Vec<Requirement>,
}

impl Production {
    /// Nominal output per hour: `floor(amount * 3600 / cycle)`.
    pub fn output_per_hour(&self) -> i64 {
        (self.amount as f64 * SECONDS_PER_HOUR / self.cycle_time_secs as f64).floor() as i64
    }

    /// Inputs per hour, negative: `floor(-3600 / cycle * amount)`.
    pub fn inputs_per_hour(&self) -> Vec<(WareId, i64)> {
        let per_cycle = -SECONDS_PER_HOUR / self.cycle_time_secs as f64;
        self.requirements
            .iter()
            .map(|r| (r.ware, (per_cycle * r.amount as f64).floor() as i64))
            .collect()
    }
}

/// Resolve what `module` produces when running `method`.
///
/// The recipe is the one for `method`, else the `"default"` one. Resource
/// requirements fall back the same way, independently of the recipe: a
/// module may run a non-default recipe and still draw default requirements.
pub fn resolve_production(
    catalog: &Catalog,
    module: WareId,
    method: &str,
) -> Result<Production, ProductionError> {
    let ware = catalog.ware_by_id(module)?;
    let spec = ware
        .as_module()
        .ok_or_else(|| ProductionError::NotAModule(ware.name.clone()))?;
    let produced = spec
        .production_for(method)
        .ok_or_else(|| ProductionError::NotAProducer(ware.name.clone()))?;

    let recipe = select_recipe(catalog.recipes(produced.ware), method).ok_or_else(|| {
        ProductionError::MissingDefaultRecipe {
            ware: catalog
                .ware(produced.ware)
                .map(|w| w.name.clone())
                .unwrap_or_default(),
            method: method.to_string(),
        }
    })?;

    let all_requirements = catalog.requirements(produced.ware);
    let mut requirements: Vec<Requirement> = all_requirements
        .iter()
        .filter(|r| r.method == method)
        .map(|r| Requirement {
            ware: r.needed,
            amount: r.amount,
        })
        .collect();
    if requirements.is_empty() {
        requirements = all_requirements
            .iter()
            .filter(|r| r.method == DEFAULT_METHOD)
            .map(|r| Requirement {
                ware: r.needed,
                amount: r.amount,
            })
            .collect();
    }

    Ok(Production {
        module,
        ware: produced.ware,
        method: method.to_string(),
        recipe_method: recipe.method.clone(),
        amount: recipe.amount,
        cycle_time_secs: recipe.cycle_time_secs,
        requirements,
    })
}

fn select_recipe<'a>(recipes: &'a [ProductionRecipe], method: &str) -> Option<&'a ProductionRecipe> {
    recipes
        .iter()
        .find(|r| r.method == method)
        .or_else(|| recipes.iter().find(|r| r.method == DEFAULT_METHOD))
}

// ---------------------------------------------------------------------------
// Settings and efficiency
// ---------------------------------------------------------------------------

/// User-controlled production settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionSettings {
    workforce_ratio: Fixed64,
    sunlight: Fixed64,
}

impl Default for ProductionSettings {
    fn default() -> Self {
        Self::new(0.0, 100.0)
    }
}

impl ProductionSettings {
    /// `workforce_ratio` is clamped into `[0, 1]`; `sunlight` is a
    /// percentage and floored at zero.
    pub fn new(workforce_ratio: f64, sunlight: f64) -> Self {
        Self {
            workforce_ratio: clamp_ratio(Fixed64::from_num(workforce_ratio)),
            sunlight: Fixed64::from_num(sunlight).max(Fixed64::ZERO),
        }
    }

    pub fn workforce_ratio(&self) -> Fixed64 {
        self.workforce_ratio
    }

    pub fn sunlight(&self) -> Fixed64 {
        self.sunlight
    }

    pub fn with_workforce_ratio(mut self, ratio: Fixed64) -> Self {
        self.workforce_ratio = clamp_ratio(ratio);
        self
    }

    pub fn with_sunlight(mut self, sunlight: Fixed64) -> Self {
        self.sunlight = sunlight.max(Fixed64::ZERO);
        self
    }

    /// The effects whose setting differs between `self` and `other`.
    pub fn changed_effects(&self, other: &ProductionSettings) -> Vec<EffectKind> {
        let mut changed = Vec::new();
        if self.workforce_ratio != other.workforce_ratio {
            changed.push(EffectKind::Work);
        }
        if self.sunlight != other.sunlight {
            changed.push(EffectKind::Sunlight);
        }
        changed
    }
}

fn clamp_ratio(ratio: Fixed64) -> Fixed64 {
    ratio.clamp(Fixed64::ZERO, Fixed64::ONE)
}

/// How the sunlight setting enters the efficiency product.
///
/// Ledger details divide the percentage by 100; the shortfall resolver
/// multiplies by the raw setting. Both conventions are kept as observed
/// until the intended unit is clarified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunlightScale {
    Percent,
    Raw,
}

/// Look up an effect for (ware, method), falling back to the default method.
pub fn find_effect<'a>(
    catalog: &'a Catalog,
    ware: WareId,
    method: &str,
    kind: &EffectKind,
) -> Option<&'a Effect> {
    let effects = catalog.effects(ware);
    effects
        .iter()
        .find(|e| &e.kind == kind && e.method == method)
        .or_else(|| {
            effects
                .iter()
                .find(|e| &e.kind == kind && e.method == DEFAULT_METHOD)
        })
}

/// Effects that influence the output of (ware, method).
pub fn declared_effects(catalog: &Catalog, ware: WareId, method: &str) -> Vec<EffectKind> {
    let mut kinds: Vec<EffectKind> = Vec::new();
    for effect in catalog.effects(ware) {
        if (effect.method == method || effect.method == DEFAULT_METHOD)
            && !kinds.contains(&effect.kind)
        {
            kinds.push(effect.kind.clone());
        }
    }
    kinds
}

/// Output multiplier for (ware, method) under `settings`.
///
/// Starts at 1. A `work` effect multiplies by `product * workforce + 1`;
/// a `sunlight` effect multiplies by the sunlight setting, scaled per
/// `scale`. Other effects do not change the output.
pub fn efficiency(
    catalog: &Catalog,
    ware: WareId,
    method: &str,
    settings: &ProductionSettings,
    scale: SunlightScale,
) -> Fixed64 {
    let mut result = Fixed64::ONE;
    if let Some(work) = find_effect(catalog, ware, method, &EffectKind::Work) {
        result *= work.product * settings.workforce_ratio() + Fixed64::ONE;
    }
    if find_effect(catalog, ware, method, &EffectKind::Sunlight).is_some() {
        result *= match scale {
            SunlightScale::Percent => settings.sunlight() / Fixed64::from_num(100),
            SunlightScale::Raw => settings.sunlight(),
        };
    }
    result
}
