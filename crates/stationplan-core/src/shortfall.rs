//! Shortfall resolution ("auto-add").
//!
//! [`compute_needed_modules`] runs a single pass over the ledger and proposes
//! production modules for every manufactured ware with a negative net
//! amount. [`AutoAdd`] repeats passes against a [`Station`], placing the
//! proposals each time, until a pass proposes nothing.

use crate::catalog::{Catalog, Producer};
use crate::change::ChangeSet;
use crate::config::AutoAddConfig;
use crate::entity::DEFAULT_METHOD;
use crate::fixed::{Fixed64, ceil_to_u32, checked_div_64};
use crate::id::WareId;
use crate::ledger::{ModuleOrder, ProductLedger, contributions};
use crate::production::{ProductionError, ProductionSettings, SunlightScale};
use crate::station::{Station, StationError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum ShortfallError {
    #[error("no module produces '{0}'")]
    NoProducerFound(String),
    #[error(transparent)]
    Production(#[from] ProductionError),
    #[error(transparent)]
    Station(#[from] StationError),
}

// ---------------------------------------------------------------------------
// Single pass
// ---------------------------------------------------------------------------

/// Modules proposed for one shortage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAddition {
    pub module: WareId,
    pub method: String,
    pub count: u32,
}

impl ModuleAddition {
    pub fn to_order(&self) -> ModuleOrder {
        ModuleOrder::new(self.module, self.count).with_method(&self.method)
    }
}

/// Result of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortfallPlan {
    pub additions: Vec<ModuleAddition>,
    /// Short wares whose producer yields nothing under the current
    /// settings. They were skipped for this pass.
    pub unresolved: Vec<WareId>,
}

impl ShortfallPlan {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty()
    }

    pub fn orders(&self) -> Vec<ModuleOrder> {
        self.additions.iter().map(ModuleAddition::to_order).collect()
    }
}

/// Propose the modules needed to cover every shortage of a manufactured
/// ware in `ledger`.
///
/// Wares are visited by ascending tier (ties by id). Each proposal's
/// outputs and inputs are accumulated in a pending map, so later wares see
/// the effect of earlier proposals from the same pass.
///
/// Output per module is computed with the raw sunlight setting, unlike
/// ledger details which use it as a percentage.
pub fn compute_needed_modules(
    catalog: &Catalog,
    ledger: &ProductLedger,
    settings: &ProductionSettings,
) -> Result<ShortfallPlan, ShortfallError> {
    let mut wares: Vec<(u32, WareId)> = ledger
        .entries()
        .map(|e| (catalog.tier(e.ware), e.ware))
        .filter(|(tier, _)| *tier > 0)
        .collect();
    wares.sort_unstable();

    let mut pending: BTreeMap<WareId, Fixed64> = BTreeMap::new();
    let mut excluded: BTreeSet<WareId> = BTreeSet::new();
    let mut plan = ShortfallPlan::default();

    for (_, ware) in wares {
        let total = ledger.net(ware) + pending.get(&ware).copied().unwrap_or(Fixed64::ZERO);
        if total >= Fixed64::ZERO || excluded.contains(&ware) {
            continue;
        }

        let producer = choose_producer(catalog.producers_of(ware)).ok_or_else(|| {
            ShortfallError::NoProducerFound(ware_name(catalog, ware))
        })?;
        let contribs = contributions(
            catalog,
            settings,
            producer.module,
            &producer.method,
            SunlightScale::Raw,
        )?;
        let per_module = contribs
            .iter()
            .find(|c| c.ware == ware && c.per_module > 0)
            .map(|c| c.effective())
            .unwrap_or(Fixed64::ZERO);

        let needed = match checked_div_64(-total, per_module) {
            Some(ratio) if per_module > Fixed64::ZERO => ceil_to_u32(ratio),
            _ => 0,
        };
        if needed == 0 {
            tracing::warn!(
                ware = %ware_name(catalog, ware),
                module = %ware_name(catalog, producer.module),
                "shortfall: producer yields nothing, ware excluded"
            );
            excluded.insert(ware);
            plan.unresolved.push(ware);
            continue;
        }

        for c in &contribs {
            let delta = c.effective() * Fixed64::from_num(needed);
            *pending.entry(c.ware).or_insert(Fixed64::ZERO) += delta;
        }
        merge_addition(&mut plan.additions, producer, needed);
    }

    Ok(plan)
}

/// The producer running the default method, else the first one.
fn choose_producer(producers: &[Producer]) -> Option<&Producer> {
    producers
        .iter()
        .find(|p| p.method == DEFAULT_METHOD)
        .or_else(|| producers.first())
}

fn merge_addition(additions: &mut Vec<ModuleAddition>, producer: &Producer, count: u32) {
    match additions
        .iter_mut()
        .find(|a| a.module == producer.module && a.method == producer.method)
    {
        Some(existing) => existing.count = existing.count.saturating_add(count),
        None => additions.push(ModuleAddition {
            module: producer.module,
            method: producer.method.clone(),
            count,
        }),
    }
}

fn ware_name(catalog: &Catalog, ware: WareId) -> String {
    catalog
        .ware(ware)
        .map(|w| w.name.clone())
        .unwrap_or_else(|| format!("#{}", ware.0))
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// How an auto-add run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoAddOutcome {
    /// A pass proposed nothing.
    Converged,
    Cancelled,
    /// The configured pass limit was reached with shortages left.
    IterationCap,
}

/// Everything an auto-add run did to the station.
#[derive(Debug, Clone, Default)]
pub struct AutoAddReport {
    pub outcome: Option<AutoAddOutcome>,
    pub passes: u32,
    /// Placed modules, merged per (module, method).
    pub added: Vec<ModuleAddition>,
    /// Wares that were unresolvable in the last pass.
    pub unresolved: Vec<WareId>,
    pub changes: ChangeSet,
}

/// Repeats shortfall passes against a station until it stops changing.
///
/// Each pass is computed in full and then placed, so the station never
/// holds a partially applied pass. The cancellation flag is checked before
/// every pass; [`AutoAdd::step`] lets a host yield between passes.
#[derive(Debug)]
pub struct AutoAdd {
    max_passes: u32,
    cancel: Arc<AtomicBool>,
    report: AutoAddReport,
}

impl AutoAdd {
    pub fn new(config: &AutoAddConfig) -> Self {
        Self {
            max_passes: config.max_passes,
            cancel: Arc::new(AtomicBool::new(false)),
            report: AutoAddReport::default(),
        }
    }

    /// A handle another thread can set to stop the run before its next pass.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn report(&self) -> &AutoAddReport {
        &self.report
    }

    pub fn is_finished(&self) -> bool {
        self.report.outcome.is_some()
    }

    /// Run one pass. Returns the outcome once the run has finished, `None`
    /// while more passes are needed.
    pub fn step(&mut self, station: &mut Station) -> Result<Option<AutoAddOutcome>, ShortfallError> {
        if let Some(outcome) = self.report.outcome {
            return Ok(Some(outcome));
        }
        if self.cancel.load(Ordering::Relaxed) {
            return Ok(Some(self.finish(AutoAddOutcome::Cancelled)));
        }

        let plan = compute_needed_modules(station.catalog(), station.ledger(), station.settings())?;
        if self.report.passes >= self.max_passes {
            // Out of passes: only look whether the last one already balanced.
            self.report.unresolved = plan.unresolved.clone();
            if plan.is_empty() {
                return Ok(Some(self.finish(AutoAddOutcome::Converged)));
            }
            tracing::warn!(
                passes = self.report.passes,
                "auto-add: pass limit reached with shortages left"
            );
            return Ok(Some(self.finish(AutoAddOutcome::IterationCap)));
        }
        self.report.passes += 1;
        self.report.unresolved = plan.unresolved.clone();

        if plan.is_empty() {
            return Ok(Some(self.finish(AutoAddOutcome::Converged)));
        }

        let changes = station.place_modules(&plan.orders())?;
        tracing::info!(
            pass = self.report.passes,
            additions = plan.additions.len(),
            modules = plan.additions.iter().map(|a| a.count).sum::<u32>(),
            unresolved = plan.unresolved.len(),
            "auto-add: pass placed modules"
        );
        self.report.changes.merge(changes);
        for addition in &plan.additions {
            match self
                .report
                .added
                .iter_mut()
                .find(|a| a.module == addition.module && a.method == addition.method)
            {
                Some(existing) => existing.count = existing.count.saturating_add(addition.count),
                None => self.report.added.push(addition.clone()),
            }
        }
        Ok(None)
    }

    /// Run passes until the run finishes.
    pub fn run(mut self, station: &mut Station) -> Result<AutoAddReport, ShortfallError> {
        while self.step(station)?.is_none() {}
        Ok(self.report)
    }

    fn finish(&mut self, outcome: AutoAddOutcome) -> AutoAddOutcome {
        self.report.outcome = Some(outcome);
        tracing::info!(
            outcome = ?outcome,
            passes = self.report.passes,
            unresolved = self.report.unresolved.len(),
            "auto-add: finished"
        );
        outcome
    }
}
