//! The product ledger: per-ware net production of all placed modules.
//!
//! Each [`LedgerEntry`] holds one [`LedgerDetail`] per contributing
//! (module, method, role). The net amount of a ware is always computed from
//! its details and never stored on its own.
//!
//! Mutations resolve every contribution before touching the ledger, so a
//! failing call leaves it unchanged. Adds and removes also reject any
//! result whose amounts leave the [`Fixed64`] range.

use crate::catalog::Catalog;
use crate::change::ChangeSet;
use crate::entity::{DEFAULT_METHOD, EffectKind};
use crate::fixed::Fixed64;
use crate::id::WareId;
use crate::production::{
    ProductionError, ProductionSettings, SunlightScale, declared_effects, efficiency,
    resolve_production,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Production(#[from] ProductionError),
    #[error("cannot remove {requested} x '{module}' ({method}): only {placed} in the ledger")]
    NotPlaced {
        module: String,
        method: String,
        requested: u32,
        placed: u32,
    },
    #[error("production of '{ware}' is out of the ledger range")]
    Overflow { ware: String },
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// A number of identical modules running one method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleOrder {
    pub module: WareId,
    pub method: String,
    pub count: u32,
}

impl ModuleOrder {
    /// `count` modules running the default method.
    pub fn new(module: WareId, count: u32) -> Self {
        Self {
            module,
            method: DEFAULT_METHOD.to_string(),
            count,
        }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Whether a detail is the module's output or one of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetailRole {
    Output,
    Input,
}

/// One module group's contribution to a ware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDetail {
    pub module: WareId,
    pub method: String,
    pub role: DetailRole,
    pub count: u32,
    /// Nominal signed amount per hour for one module.
    pub per_module: i64,
    pub efficiency: Fixed64,
    /// Effects applied to this detail. Empty for inputs.
    pub effects: Vec<EffectKind>,
}

impl LedgerDetail {
    /// Signed amount per hour for the whole group. Saturates at the
    /// [`Fixed64`] bounds.
    pub fn amount(&self) -> Fixed64 {
        let nominal = self.per_module.saturating_mul(i64::from(self.count));
        Fixed64::saturating_from_num(nominal).saturating_mul(self.efficiency)
    }

    /// [`amount`](Self::amount), or `None` when it does not fit.
    pub fn checked_amount(&self) -> Option<Fixed64> {
        let nominal = self.per_module.checked_mul(i64::from(self.count))?;
        Fixed64::checked_from_num(nominal)?.checked_mul(self.efficiency)
    }

    fn key(&self) -> (WareId, &str, DetailRole) {
        (self.module, self.method.as_str(), self.role)
    }
}

/// The ledger line of one ware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub ware: WareId,
    details: Vec<LedgerDetail>,
}

impl LedgerEntry {
    fn new(ware: WareId) -> Self {
        Self {
            ware,
            details: Vec::new(),
        }
    }

    /// Net amount per hour: the sum of all details.
    pub fn net(&self) -> Fixed64 {
        self.details
            .iter()
            .fold(Fixed64::ZERO, |acc, d| acc.saturating_add(d.amount()))
    }

    fn checked_net(&self) -> Option<Fixed64> {
        self.details
            .iter()
            .try_fold(Fixed64::ZERO, |acc, d| acc.checked_add(d.checked_amount()?))
    }

    /// Per-module breakdown, ordered by (module, method, role).
    pub fn details(&self) -> &[LedgerDetail] {
        &self.details
    }

    pub fn produced(&self) -> Fixed64 {
        self.details
            .iter()
            .filter(|d| d.role == DetailRole::Output)
            .fold(Fixed64::ZERO, |acc, d| acc.saturating_add(d.amount()))
    }

    pub fn consumed(&self) -> Fixed64 {
        self.details
            .iter()
            .filter(|d| d.role == DetailRole::Input)
            .fold(Fixed64::ZERO, |acc, d| acc.saturating_add(d.amount()))
    }

    fn find(&self, module: WareId, method: &str, role: DetailRole) -> Result<usize, usize> {
        self.details
            .binary_search_by(|d| d.key().cmp(&(module, method, role)))
    }
}

// ---------------------------------------------------------------------------
// Contributions
// ---------------------------------------------------------------------------

/// What one module running one method adds to one ware.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub ware: WareId,
    pub role: DetailRole,
    pub per_module: i64,
    pub efficiency: Fixed64,
    pub effects: Vec<EffectKind>,
}

impl Contribution {
    /// Effective amount per hour for one module.
    pub fn effective(&self) -> Fixed64 {
        Fixed64::from_num(self.per_module) * self.efficiency
    }
}

/// Resolve the per-module contributions of `module` running `method`.
///
/// Modules without productions (habitation, storage, ...) contribute
/// nothing.
pub fn contributions(
    catalog: &Catalog,
    settings: &ProductionSettings,
    module: WareId,
    method: &str,
    scale: SunlightScale,
) -> Result<Vec<Contribution>, ProductionError> {
    let production = match resolve_production(catalog, module, method) {
        Ok(p) => p,
        Err(ProductionError::NotAProducer(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut result = Vec::with_capacity(production.requirements.len() + 1);
    result.push(Contribution {
        ware: production.ware,
        role: DetailRole::Output,
        per_module: production.output_per_hour(),
        efficiency: efficiency(catalog, production.ware, method, settings, scale),
        effects: declared_effects(catalog, production.ware, method),
    });
    for (ware, per_hour) in production.inputs_per_hour() {
        result.push(Contribution {
            ware,
            role: DetailRole::Input,
            per_module: per_hour,
            efficiency: Fixed64::ONE,
            effects: Vec::new(),
        });
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Per-ware aggregation of every placed module's contribution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductLedger {
    entries: BTreeMap<WareId, LedgerEntry>,
}

impl ProductLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the contributions of `orders`. Adding a module group already in
    /// the ledger increases its count.
    pub fn add_modules(
        &mut self,
        catalog: &Catalog,
        settings: &ProductionSettings,
        orders: &[ModuleOrder],
    ) -> Result<ChangeSet, LedgerError> {
        let resolved = resolve_orders(catalog, settings, orders)?;
        let mut next = self.clone();
        let mut changes = ChangeSet::new();
        for (order, contribs) in &resolved {
            for c in contribs {
                next.apply_delta(order, c, i64::from(order.count), &mut changes)
                    .map_err(|ware| overflow(catalog, ware))?;
            }
        }
        next.check_range(catalog, &changes)?;
        *self = next;
        tracing::debug!(
            orders = orders.len(),
            wares = changes.changed_wares().len(),
            "ledger: modules added"
        );
        Ok(changes)
    }

    /// Remove the contributions of `orders`. Entries left without details
    /// are deleted.
    pub fn remove_modules(
        &mut self,
        catalog: &Catalog,
        settings: &ProductionSettings,
        orders: &[ModuleOrder],
    ) -> Result<ChangeSet, LedgerError> {
        let resolved = resolve_orders(catalog, settings, orders)?;

        // Check every removal against the current counts before applying any.
        let mut requested: HashMap<(WareId, WareId, &str, DetailRole), u32> = HashMap::new();
        for (order, contribs) in &resolved {
            for c in contribs {
                let count = requested
                    .entry((c.ware, order.module, order.method.as_str(), c.role))
                    .or_default();
                *count = count.saturating_add(order.count);
            }
        }
        for (&(ware, module, method, role), &count) in &requested {
            let placed = self
                .entries
                .get(&ware)
                .and_then(|e| e.find(module, method, role).ok().map(|i| e.details[i].count))
                .unwrap_or(0);
            if placed < count {
                return Err(LedgerError::NotPlaced {
                    module: catalog
                        .ware(module)
                        .map(|w| w.name.clone())
                        .unwrap_or_default(),
                    method: method.to_string(),
                    requested: count,
                    placed,
                });
            }
        }

        let mut next = self.clone();
        let mut changes = ChangeSet::new();
        for (order, contribs) in &resolved {
            for c in contribs {
                next.apply_delta(order, c, -i64::from(order.count), &mut changes)
                    .map_err(|ware| overflow(catalog, ware))?;
            }
        }
        // Dropping one side of a balanced ware can leave the rest out of range.
        next.check_range(catalog, &changes)?;
        *self = next;
        tracing::debug!(
            orders = orders.len(),
            wares = changes.changed_wares().len(),
            removed = changes.removed_wares().len(),
            "ledger: modules removed"
        );
        Ok(changes)
    }

    /// Apply a count change of one module group from `previous` to
    /// `order.count`. Only that group's details are touched.
    pub fn on_module_count_changed(
        &mut self,
        catalog: &Catalog,
        settings: &ProductionSettings,
        order: &ModuleOrder,
        previous: u32,
    ) -> Result<ChangeSet, LedgerError> {
        use std::cmp::Ordering;
        match order.count.cmp(&previous) {
            Ordering::Equal => Ok(ChangeSet::new()),
            Ordering::Greater => {
                let delta = ModuleOrder {
                    count: order.count - previous,
                    ..order.clone()
                };
                self.add_modules(catalog, settings, std::slice::from_ref(&delta))
            }
            Ordering::Less => {
                let delta = ModuleOrder {
                    count: previous - order.count,
                    ..order.clone()
                };
                self.remove_modules(catalog, settings, std::slice::from_ref(&delta))
            }
        }
    }

    /// Re-apply efficiency to every detail declaring `effect`. Recipe and
    /// requirement bindings are left as they are. Amounts pushed past the
    /// [`Fixed64`] range saturate.
    pub fn on_settings_changed(
        &mut self,
        catalog: &Catalog,
        settings: &ProductionSettings,
        effect: &EffectKind,
    ) -> ChangeSet {
        let mut changes = ChangeSet::new();
        for (ware, entry) in &mut self.entries {
            for detail in &mut entry.details {
                if !detail.effects.contains(effect) {
                    continue;
                }
                let updated = efficiency(
                    catalog,
                    *ware,
                    &detail.method,
                    settings,
                    SunlightScale::Percent,
                );
                if updated != detail.efficiency {
                    detail.efficiency = updated;
                    changes.mark_ware(*ware);
                }
            }
        }
        tracing::debug!(
            effect = effect.name(),
            wares = changes.changed_wares().len(),
            "ledger: efficiency re-applied"
        );
        changes
    }

    /// Move one detail's count by `delta`. Fails with the ware when the
    /// count leaves the `u32` range.
    fn apply_delta(
        &mut self,
        order: &ModuleOrder,
        c: &Contribution,
        delta: i64,
        changes: &mut ChangeSet,
    ) -> Result<(), WareId> {
        if delta == 0 {
            return Ok(());
        }
        let entry = self
            .entries
            .entry(c.ware)
            .or_insert_with(|| LedgerEntry::new(c.ware));
        match entry.find(order.module, &order.method, c.role) {
            Ok(i) => {
                let detail = &mut entry.details[i];
                let count = u32::try_from(i64::from(detail.count) + delta).map_err(|_| c.ware)?;
                if count == 0 {
                    entry.details.remove(i);
                } else {
                    detail.count = count;
                }
            }
            Err(i) if delta > 0 => {
                entry.details.insert(
                    i,
                    LedgerDetail {
                        module: order.module,
                        method: order.method.clone(),
                        role: c.role,
                        count: u32::try_from(delta).map_err(|_| c.ware)?,
                        per_module: c.per_module,
                        efficiency: c.efficiency,
                        effects: c.effects.clone(),
                    },
                );
            }
            Err(_) => {}
        }
        if entry.details.is_empty() {
            self.entries.remove(&c.ware);
            changes.mark_removed(c.ware);
        } else {
            changes.mark_ware(c.ware);
        }
        Ok(())
    }

    fn check_range(&self, catalog: &Catalog, changes: &ChangeSet) -> Result<(), LedgerError> {
        for &ware in changes.changed_wares() {
            let fits = self
                .entries
                .get(&ware)
                .is_none_or(|e| e.checked_net().is_some());
            if !fits {
                return Err(overflow(catalog, ware));
            }
        }
        Ok(())
    }

    pub fn entry(&self, ware: WareId) -> Option<&LedgerEntry> {
        self.entries.get(&ware)
    }

    /// All entries, ordered by ware id.
    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.entries.values()
    }

    /// Net amount per hour of `ware`; zero when no module touches it.
    pub fn net(&self, ware: WareId) -> Fixed64 {
        self.entries.get(&ware).map(LedgerEntry::net).unwrap_or(Fixed64::ZERO)
    }

    /// Net amounts of every ware in the ledger.
    pub fn totals(&self) -> BTreeMap<WareId, Fixed64> {
        self.entries.iter().map(|(w, e)| (*w, e.net())).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wares with a negative net amount, ordered by ware id.
    pub fn shortages(&self) -> Vec<(WareId, Fixed64)> {
        self.entries
            .iter()
            .map(|(w, e)| (*w, e.net()))
            .filter(|(_, net)| *net < Fixed64::ZERO)
            .collect()
    }
}

fn overflow(catalog: &Catalog, ware: WareId) -> LedgerError {
    LedgerError::Overflow {
        ware: catalog.ware(ware).map(|w| w.name.clone()).unwrap_or_default(),
    }
}

fn resolve_orders<'a>(
    catalog: &Catalog,
    settings: &ProductionSettings,
    orders: &'a [ModuleOrder],
) -> Result<Vec<(&'a ModuleOrder, Vec<Contribution>)>, ProductionError> {
    orders
        .iter()
        .filter(|o| o.count > 0)
        .map(|o| {
            let contribs = contributions(catalog, settings, o.module, &o.method, SunlightScale::Percent)?;
            Ok((o, contribs))
        })
        .collect()
}
