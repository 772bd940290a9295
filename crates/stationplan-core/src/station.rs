//! The station work area.
//!
//! A [`Station`] owns the placed modules being edited and keeps a
//! [`ProductLedger`] in step with them. Every mutation is validated in full
//! before anything changes and returns the [`ChangeSet`] it produced.

use crate::catalog::{Catalog, CatalogError};
use crate::change::ChangeSet;
use crate::command_queue::{Command, CommandQueue, Ticket};
use crate::compat::fits_slot;
use crate::config::{PlannerConfig, SettingsConfig};
use crate::entity::ModuleType;
use crate::fixed::{Fixed64, fixed64_to_f64};
use crate::id::{PlacementId, WareId};
use crate::ledger::{LedgerEntry, LedgerError, ProductLedger};
use crate::production::ProductionSettings;
use crate::serialize::{EquipmentRecord, PlacedModuleRecord, StationRecord};
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub use crate::ledger::ModuleOrder;

#[derive(Debug, thiserror::Error)]
pub enum StationError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("no placement {0:?}")]
    UnknownPlacement(PlacementId),
    #[error("cannot remove {requested} x '{module}' ({method}): only {placed} placed")]
    NotPlaced {
        module: String,
        method: String,
        requested: u32,
        placed: u32,
    },
    #[error("too many '{module}' ({method}) in one placement")]
    CountOverflow { module: String, method: String },
    #[error("module '{module}' has no connection '{connection}'")]
    NoSuchConnection { module: String, connection: String },
    #[error("'{equipment}' cannot be mounted on '{connection}' of '{module}'")]
    InvalidEquipmentAssignment {
        module: String,
        connection: String,
        equipment: String,
    },
}

// ---------------------------------------------------------------------------
// Placed modules
// ---------------------------------------------------------------------------

/// A group of identical modules placed on the station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedModule {
    pub module: WareId,
    pub method: String,
    pub count: u32,
    /// Connection name → mounted equipment.
    pub equipment: BTreeMap<String, WareId>,
}

impl PlacedModule {
    pub fn order(&self) -> ModuleOrder {
        ModuleOrder {
            module: self.module,
            method: self.method.clone(),
            count: self.count,
        }
    }
}

/// Workers required by production modules against beds provided by
/// habitation modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Workforce {
    pub required: u64,
    pub capacity: u64,
}

impl Workforce {
    /// `capacity / required`, clamped to at most 1. Zero when nothing
    /// requires workers.
    pub fn ratio(&self) -> Fixed64 {
        if self.required == 0 {
            return Fixed64::ZERO;
        }
        let ratio = Fixed64::from_num(self.capacity) / Fixed64::from_num(self.required);
        ratio.min(Fixed64::ONE)
    }
}

/// A queued command the station refused. It changed nothing.
#[derive(Debug)]
pub struct Rejected {
    pub ticket: Ticket,
    pub command: Command,
    pub error: StationError,
}

/// Result of applying a drained command queue.
#[derive(Debug, Default)]
pub struct QueueReport {
    pub changes: ChangeSet,
    pub applied: usize,
    pub rejected: Vec<Rejected>,
}

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Station {
    catalog: Arc<Catalog>,
    settings: ProductionSettings,
    placements: SlotMap<PlacementId, PlacedModule>,
    ledger: ProductLedger,
    revision: u64,
}

impl Station {
    pub fn new(catalog: Arc<Catalog>, settings: ProductionSettings) -> Self {
        Self {
            catalog,
            settings,
            placements: SlotMap::with_key(),
            ledger: ProductLedger::new(),
            revision: 0,
        }
    }

    pub fn with_config(catalog: Arc<Catalog>, config: &PlannerConfig) -> Self {
        Self::new(catalog, config.settings.to_settings())
    }

    // -- Mutation --------------------------------------------------------

    /// Place module groups. A group with the same module and method as an
    /// existing unequipped placement is merged into it.
    pub fn place_modules(&mut self, orders: &[ModuleOrder]) -> Result<ChangeSet, StationError> {
        self.check_merged_counts(orders)?;
        let mut changes = self
            .ledger
            .add_modules(&self.catalog, &self.settings, orders)?;
        for order in orders.iter().filter(|o| o.count > 0) {
            let existing = self.placements.iter_mut().find(|(_, p)| {
                p.module == order.module && p.method == order.method && p.equipment.is_empty()
            });
            let id = match existing {
                Some((id, placed)) => {
                    // Bounded by check_merged_counts.
                    placed.count = placed.count.saturating_add(order.count);
                    id
                }
                None => self.placements.insert(PlacedModule {
                    module: order.module,
                    method: order.method.clone(),
                    count: order.count,
                    equipment: BTreeMap::new(),
                }),
            };
            changes.mark_placement(id);
        }
        self.bump(&changes);
        tracing::debug!(
            orders = orders.len(),
            placements = self.placements.len(),
            "station: modules placed"
        );
        Ok(changes)
    }

    /// Every placement `orders` would grow must keep its count in `u32`.
    fn check_merged_counts(&self, orders: &[ModuleOrder]) -> Result<(), StationError> {
        let mut merged: HashMap<(WareId, &str), u32> = HashMap::new();
        for order in orders.iter().filter(|o| o.count > 0) {
            let key = (order.module, order.method.as_str());
            let count = match merged.get(&key) {
                Some(&count) => count,
                None => self
                    .placements
                    .values()
                    .find(|p| {
                        p.module == order.module
                            && p.method == order.method
                            && p.equipment.is_empty()
                    })
                    .map_or(0, |p| p.count),
            };
            let Some(total) = count.checked_add(order.count) else {
                return Err(StationError::CountOverflow {
                    module: self.ware_name(order.module),
                    method: order.method.clone(),
                });
            };
            merged.insert(key, total);
        }
        Ok(())
    }

    /// Remove module counts by (module, method), across placements.
    /// Placements reaching zero are deleted.
    pub fn remove_modules(&mut self, orders: &[ModuleOrder]) -> Result<ChangeSet, StationError> {
        let mut requested: HashMap<(WareId, &str), u32> = HashMap::new();
        for order in orders {
            let count = requested
                .entry((order.module, order.method.as_str()))
                .or_default();
            *count = count.saturating_add(order.count);
        }
        for (&(module, method), &count) in &requested {
            let placed: u32 = self
                .placements
                .values()
                .filter(|p| p.module == module && p.method == method)
                .map(|p| p.count)
                .sum();
            if placed < count {
                return Err(StationError::NotPlaced {
                    module: self.ware_name(module),
                    method: method.to_string(),
                    requested: count,
                    placed,
                });
            }
        }

        let mut changes = self
            .ledger
            .remove_modules(&self.catalog, &self.settings, orders)?;
        for order in orders {
            let mut remaining = order.count;
            let ids: Vec<PlacementId> = self
                .placements
                .iter()
                .filter(|(_, p)| p.module == order.module && p.method == order.method)
                .map(|(id, _)| id)
                .collect();
            for id in ids {
                if remaining == 0 {
                    break;
                }
                let Some(placed) = self.placements.get_mut(id) else {
                    continue;
                };
                let taken = remaining.min(placed.count);
                placed.count -= taken;
                remaining -= taken;
                if placed.count == 0 {
                    self.placements.remove(id);
                }
                changes.mark_placement(id);
            }
        }
        self.bump(&changes);
        Ok(changes)
    }

    pub fn remove_placement(&mut self, id: PlacementId) -> Result<ChangeSet, StationError> {
        let placed = self
            .placements
            .get(id)
            .ok_or(StationError::UnknownPlacement(id))?;
        let mut changes = self.ledger.remove_modules(
            &self.catalog,
            &self.settings,
            std::slice::from_ref(&placed.order()),
        )?;
        self.placements.remove(id);
        changes.mark_placement(id);
        self.bump(&changes);
        Ok(changes)
    }

    /// Set the count of one placement. A count of zero removes it.
    pub fn change_module_count(
        &mut self,
        id: PlacementId,
        count: u32,
    ) -> Result<ChangeSet, StationError> {
        let placed = self
            .placements
            .get(id)
            .ok_or(StationError::UnknownPlacement(id))?;
        let previous = placed.count;
        let order = ModuleOrder {
            count,
            ..placed.order()
        };
        let mut changes =
            self.ledger
                .on_module_count_changed(&self.catalog, &self.settings, &order, previous)?;
        if count == 0 {
            self.placements.remove(id);
        } else if let Some(placed) = self.placements.get_mut(id) {
            placed.count = count;
        }
        if count != previous {
            changes.mark_placement(id);
        }
        self.bump(&changes);
        Ok(changes)
    }

    /// Mount `equipment` on a connection of a placement, or clear it with
    /// `None`. The ledger is not affected.
    pub fn set_equipment(
        &mut self,
        id: PlacementId,
        connection: &str,
        equipment: Option<WareId>,
    ) -> Result<ChangeSet, StationError> {
        let placed = self
            .placements
            .get(id)
            .ok_or(StationError::UnknownPlacement(id))?;
        if let Some(equipment) = equipment {
            self.check_equipment(placed.module, connection, equipment)?;
        } else if self.catalog.connection(placed.module, connection).is_none() {
            return Err(StationError::NoSuchConnection {
                module: self.ware_name(placed.module),
                connection: connection.to_string(),
            });
        }

        let mut changes = ChangeSet::new();
        if let Some(placed) = self.placements.get_mut(id) {
            let previous = match equipment {
                Some(equipment) => placed.equipment.insert(connection.to_string(), equipment),
                None => placed.equipment.remove(connection),
            };
            if previous != equipment {
                changes.mark_placement(id);
            }
        }
        self.bump(&changes);
        Ok(changes)
    }

    /// Change the production settings and re-apply efficiency to the
    /// affected ledger details.
    pub fn update_settings(&mut self, workforce_ratio: f64, sunlight: f64) -> ChangeSet {
        self.set_settings(ProductionSettings::new(workforce_ratio, sunlight))
    }

    pub fn set_settings(&mut self, settings: ProductionSettings) -> ChangeSet {
        let effects = self.settings.changed_effects(&settings);
        let mut changes = ChangeSet::new();
        if effects.is_empty() {
            return changes;
        }
        self.settings = settings;
        changes.mark_settings();
        for effect in &effects {
            changes.merge(
                self.ledger
                    .on_settings_changed(&self.catalog, &self.settings, effect),
            );
        }
        self.bump(&changes);
        tracing::debug!(
            workforce_ratio = fixed64_to_f64(settings.workforce_ratio()),
            sunlight = fixed64_to_f64(settings.sunlight()),
            wares = changes.changed_wares().len(),
            "station: settings updated"
        );
        changes
    }

    /// Feed the workforce ratio of the placed modules into the settings.
    pub fn sync_workforce(&mut self) -> ChangeSet {
        let ratio = self.workforce().ratio();
        self.set_settings(self.settings.with_workforce_ratio(ratio))
    }

    // -- Commands --------------------------------------------------------

    pub fn execute(&mut self, command: &Command) -> Result<ChangeSet, StationError> {
        match command {
            Command::PlaceModules { orders } => self.place_modules(orders),
            Command::RemoveModules { orders } => self.remove_modules(orders),
            Command::RemovePlacement { placement } => self.remove_placement(*placement),
            Command::ChangeModuleCount { placement, count } => {
                self.change_module_count(*placement, *count)
            }
            Command::SetEquipment {
                placement,
                connection,
                equipment,
            } => self.set_equipment(*placement, connection, *equipment),
            Command::UpdateSettings {
                workforce_ratio,
                sunlight,
            } => Ok(self.update_settings(*workforce_ratio, *sunlight)),
            Command::SyncWorkforce => Ok(self.sync_workforce()),
        }
    }

    /// Drain `queue` and apply its commands in submission order. A rejected
    /// command is reported and the rest still run.
    pub fn apply_queue(&mut self, queue: &mut CommandQueue) -> QueueReport {
        let mut report = QueueReport::default();
        while let Some(submitted) = queue.pop() {
            match self.execute(&submitted.command) {
                Ok(changes) => {
                    report.applied += 1;
                    report.changes.merge(changes);
                    queue.record(submitted, self.revision, true);
                }
                Err(error) => {
                    tracing::warn!(
                        ticket = submitted.ticket.0,
                        error = %error,
                        "station: command rejected"
                    );
                    report.rejected.push(Rejected {
                        ticket: submitted.ticket,
                        command: submitted.command.clone(),
                        error,
                    });
                    queue.record(submitted, self.revision, false);
                }
            }
        }
        report
    }

    // -- Reads -----------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_handle(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn settings(&self) -> &ProductionSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &ProductLedger {
        &self.ledger
    }

    pub fn ledger_entry(&self, ware: WareId) -> Option<&LedgerEntry> {
        self.ledger.entry(ware)
    }

    pub fn placement(&self, id: PlacementId) -> Option<&PlacedModule> {
        self.placements.get(id)
    }

    pub fn placements(&self) -> impl Iterator<Item = (PlacementId, &PlacedModule)> + '_ {
        self.placements.iter()
    }

    /// Total number of placed modules.
    pub fn module_count(&self) -> u64 {
        self.placements.values().map(|p| u64::from(p.count)).sum()
    }

    /// Incremented by every mutation that changed something.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn workforce(&self) -> Workforce {
        let mut workforce = Workforce::default();
        for placed in self.placements.values() {
            let Some(spec) = self.catalog.module(placed.module) else {
                continue;
            };
            let total = spec.workforce as u64 * placed.count as u64;
            match spec.module_type {
                ModuleType::Production => workforce.required += total,
                ModuleType::Habitation => workforce.capacity += total,
                _ => {}
            }
        }
        workforce
    }

    // -- Records ---------------------------------------------------------

    pub fn to_record(&self) -> StationRecord {
        let modules = self
            .placements
            .values()
            .map(|p| PlacedModuleRecord {
                module: self.ware_name(p.module),
                count: p.count,
                method: p.method.clone(),
                equipment: p
                    .equipment
                    .iter()
                    .map(|(connection, equipment)| EquipmentRecord {
                        connection: connection.clone(),
                        equipment: self.ware_name(*equipment),
                    })
                    .collect(),
            })
            .collect();
        StationRecord {
            modules,
            settings: SettingsConfig {
                workforce_ratio: fixed64_to_f64(self.settings.workforce_ratio()),
                sunlight: fixed64_to_f64(self.settings.sunlight()),
            },
        }
    }

    /// Rebuild a station from a record. Every name must resolve and every
    /// equipment entry must fit its connection.
    pub fn from_record(catalog: Arc<Catalog>, record: &StationRecord) -> Result<Self, StationError> {
        let mut station = Station::new(catalog, record.settings.to_settings());

        let mut placements = Vec::with_capacity(record.modules.len());
        for module_record in record.modules.iter().filter(|m| m.count > 0) {
            let module = station.catalog.get(&module_record.module)?.id;
            let mut equipment = BTreeMap::new();
            for entry in &module_record.equipment {
                let item = station.catalog.get(&entry.equipment)?.id;
                station.check_equipment(module, &entry.connection, item)?;
                equipment.insert(entry.connection.clone(), item);
            }
            placements.push(PlacedModule {
                module,
                method: module_record.method.clone(),
                count: module_record.count,
                equipment,
            });
        }

        let orders: Vec<ModuleOrder> = placements.iter().map(PlacedModule::order).collect();
        station
            .ledger
            .add_modules(&station.catalog, &station.settings, &orders)?;
        for placed in placements {
            station.placements.insert(placed);
        }
        tracing::info!(
            placements = station.placements.len(),
            wares = station.ledger.len(),
            "station: restored from record"
        );
        Ok(station)
    }

    // -- Helpers ---------------------------------------------------------

    fn check_equipment(
        &self,
        module: WareId,
        connection: &str,
        equipment: WareId,
    ) -> Result<(), StationError> {
        let slot = self.catalog.connection(module, connection).ok_or_else(|| {
            StationError::NoSuchConnection {
                module: self.ware_name(module),
                connection: connection.to_string(),
            }
        })?;
        let ware = self.catalog.ware_by_id(equipment)?;
        if !fits_slot(slot, ware) {
            return Err(StationError::InvalidEquipmentAssignment {
                module: self.ware_name(module),
                connection: connection.to_string(),
                equipment: ware.name.clone(),
            });
        }
        Ok(())
    }

    fn ware_name(&self, id: WareId) -> String {
        self.catalog
            .ware(id)
            .map(|w| w.name.clone())
            .unwrap_or_else(|| format!("#{}", id.0))
    }

    fn bump(&mut self, changes: &ChangeSet) {
        if !changes.is_empty() {
            self.revision += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::ProductionError;
    use crate::test_utils::*;

    fn id(station: &Station, name: &str) -> WareId {
        station.catalog().ware_id(name).unwrap()
    }

    fn place(station: &mut Station, module: &str, count: u32) -> PlacementId {
        let o = order(station.catalog(), module, count);
        let changes = station.place_modules(&[o]).unwrap();
        *changes.placements().iter().next().unwrap()
    }

    #[test]
    fn placing_updates_the_ledger() {
        let mut station = sample_station();
        place(&mut station, "prod_energycells", 3);
        assert_eq!(net(&station, "energycells"), fixed(30.0));
        assert_eq!(net(&station, "ore"), fixed(-6.0));
        assert_eq!(station.module_count(), 3);
    }

    #[test]
    fn identical_orders_merge_into_one_placement() {
        let mut station = sample_station();
        let a = place(&mut station, "prod_energycells", 1);
        let b = place(&mut station, "prod_energycells", 2);
        assert_eq!(a, b);
        assert_eq!(station.placements().count(), 1);
        assert_eq!(station.placement(a).unwrap().count, 3);
    }

    #[test]
    fn different_methods_do_not_merge() {
        let mut station = sample_station();
        let module = id(&station, "prod_hullparts");
        station
            .place_modules(&[
                ModuleOrder::new(module, 1),
                ModuleOrder::new(module, 1).with_method("teladi"),
            ])
            .unwrap();
        assert_eq!(station.placements().count(), 2);
        // 5 (default) + 6 (teladi)
        assert_eq!(net(&station, "hullparts"), fixed(11.0));
    }

    #[test]
    fn rejected_place_changes_nothing() {
        let mut station = sample_station();
        let ore = id(&station, "ore");
        let err = station
            .place_modules(&[
                order(station.catalog(), "prod_energycells", 1),
                ModuleOrder::new(ore, 1),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            StationError::Ledger(LedgerError::Production(ProductionError::NotAModule(_)))
        ));
        assert!(station.ledger().is_empty());
        assert_eq!(station.placements().count(), 0);
        assert_eq!(station.revision(), 0);
    }

    #[test]
    fn out_of_range_production_is_rejected() {
        let mut station = sample_station();
        place(&mut station, "prod_energycells", 2);
        let huge = order(station.catalog(), "prod_energycells", 300_000_000);
        match station.place_modules(&[huge]) {
            Err(StationError::Ledger(LedgerError::Overflow { ware })) => {
                assert_eq!(ware, "energycells")
            }
            other => panic!("expected Overflow, got {other:?}"),
        }
        assert_eq!(net(&station, "energycells"), fixed(20.0));
        assert_eq!(station.module_count(), 2);
        assert_eq!(station.revision(), 1);
    }

    #[test]
    fn placement_count_cannot_wrap() {
        let mut station = sample_station();
        let hab = place(&mut station, "hab_argon_s", u32::MAX);
        let one_more = order(station.catalog(), "hab_argon_s", 1);
        assert!(matches!(
            station.place_modules(&[one_more]),
            Err(StationError::CountOverflow { .. })
        ));
        assert_eq!(station.placement(hab).unwrap().count, u32::MAX);
        assert_eq!(station.module_count(), u64::from(u32::MAX));
    }

    #[test]
    fn remove_modules_spans_placements() {
        let mut station = sample_station();
        let platform = place(&mut station, "def_platform", 1);
        let shield = id(&station, "shield_s");
        station
            .set_equipment(platform, "con_shield_01", Some(shield))
            .unwrap();
        place(&mut station, "def_platform", 2);
        assert_eq!(station.placements().count(), 2);

        station
            .remove_modules(&[order(station.catalog(), "def_platform", 3)])
            .unwrap();
        assert_eq!(station.placements().count(), 0);
    }

    #[test]
    fn removing_too_many_is_rejected() {
        let mut station = sample_station();
        place(&mut station, "prod_energycells", 1);
        let err = station
            .remove_modules(&[order(station.catalog(), "prod_energycells", 2)])
            .unwrap_err();
        assert!(matches!(err, StationError::NotPlaced { placed: 1, .. }));
        assert_eq!(net(&station, "energycells"), fixed(10.0));
    }

    #[test]
    fn count_change_and_removal() {
        let mut station = sample_station();
        let p = place(&mut station, "prod_energycells", 1);
        station.change_module_count(p, 4).unwrap();
        assert_eq!(net(&station, "energycells"), fixed(40.0));

        let changes = station.change_module_count(p, 0).unwrap();
        assert!(station.placement(p).is_none());
        assert!(station.ledger().is_empty());
        assert!(changes.placements().contains(&p));
        assert!(matches!(
            station.change_module_count(p, 1),
            Err(StationError::UnknownPlacement(_))
        ));
    }

    #[test]
    fn remove_placement_restores_ledger() {
        let mut station = sample_station();
        place(&mut station, "prod_energycells", 2);
        let before = station.ledger().clone();
        let p = place(&mut station, "prod_refinedmetals", 1);
        station.remove_placement(p).unwrap();
        assert_eq!(station.ledger(), &before);
    }

    #[test]
    fn equipment_must_fit_the_connection() {
        let mut station = sample_station();
        let p = place(&mut station, "def_platform", 1);
        let shield_s = id(&station, "shield_s");
        let shield_l = id(&station, "shield_l");
        let turret_m = id(&station, "turret_m");

        station.set_equipment(p, "con_shield_01", Some(shield_s)).unwrap();
        let err = station
            .set_equipment(p, "con_shield_01", Some(shield_l))
            .unwrap_err();
        assert!(matches!(err, StationError::InvalidEquipmentAssignment { .. }));
        // Wrong equipment type for the slot.
        assert!(
            station
                .set_equipment(p, "con_shield_01", Some(turret_m))
                .is_err()
        );
        assert_eq!(
            station.placement(p).unwrap().equipment.get("con_shield_01"),
            Some(&shield_s)
        );

        assert!(matches!(
            station.set_equipment(p, "con_missing", None),
            Err(StationError::NoSuchConnection { .. })
        ));
        station.set_equipment(p, "con_shield_01", None).unwrap();
        assert!(station.placement(p).unwrap().equipment.is_empty());
    }

    #[test]
    fn settings_update_reports_changed_wares() {
        let mut station = sample_station();
        place(&mut station, "prod_hullparts", 2);
        place(&mut station, "prod_solarcells", 1);

        let changes = station.update_settings(1.0, 100.0);
        assert!(changes.settings_changed());
        assert!(changes.is_ware_changed(id(&station, "hullparts")));
        assert!(!changes.is_ware_changed(id(&station, "solarcells")));
        assert_eq!(net(&station, "hullparts"), fixed(15.0));

        let changes = station.update_settings(1.0, 25.0);
        assert!(changes.is_ware_changed(id(&station, "solarcells")));
        assert_eq!(net(&station, "solarcells"), fixed(25.0));

        assert!(station.update_settings(1.0, 25.0).is_empty());
    }

    #[test]
    fn workforce_is_required_against_capacity() {
        let mut station = sample_station();
        place(&mut station, "prod_hullparts", 2);
        place(&mut station, "hab_argon_s", 1);
        let workforce = station.workforce();
        assert_eq!(workforce.required, 300);
        assert_eq!(workforce.capacity, 200);
        assert_eq!(workforce.ratio(), Fixed64::from_num(200) / Fixed64::from_num(300));

        place(&mut station, "hab_argon_s", 1);
        assert_eq!(station.workforce().ratio(), Fixed64::ONE);

        station.sync_workforce();
        assert_eq!(station.settings().workforce_ratio(), Fixed64::ONE);
        assert_eq!(net(&station, "hullparts"), fixed(15.0));
    }

    #[test]
    fn queue_applies_in_order_and_reports_rejections() {
        let mut station = sample_station();
        let energy = id(&station, "prod_energycells");
        let mut queue = CommandQueue::with_journal(8);
        queue.submit(Command::PlaceModules {
            orders: vec![ModuleOrder::new(energy, 2)],
        });
        let bad = queue.submit(Command::RemoveModules {
            orders: vec![ModuleOrder::new(energy, 5)],
        });
        queue.submit(Command::UpdateSettings {
            workforce_ratio: 0.5,
            sunlight: 100.0,
        });

        let report = station.apply_queue(&mut queue);
        assert_eq!(report.applied, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].ticket, bad);
        assert!(matches!(report.rejected[0].error, StationError::NotPlaced { .. }));
        assert!(report.changes.settings_changed());
        assert_eq!(net(&station, "energycells"), fixed(20.0));

        let outcomes: Vec<bool> = queue.journal().map(|e| e.accepted).collect();
        assert_eq!(outcomes, vec![true, false, true]);
        assert_eq!(queue.journal().last().map(|e| e.revision), Some(station.revision()));
    }

    #[test]
    fn record_restores_an_equal_station() {
        let mut station = sample_station();
        place(&mut station, "prod_energycells", 3);
        let p = place(&mut station, "def_platform", 1);
        let shield = id(&station, "shield_s");
        station.set_equipment(p, "con_shield_01", Some(shield)).unwrap();
        station.update_settings(0.5, 60.0);

        let record = station.to_record();
        let restored = Station::from_record(station.catalog_handle(), &record).unwrap();
        assert_eq!(restored.ledger(), station.ledger());
        assert_eq!(restored.settings(), station.settings());
        assert_eq!(restored.to_record(), record);
    }

    #[test]
    fn record_with_bad_equipment_is_rejected() {
        let station = sample_station();
        let record = StationRecord {
            modules: vec![PlacedModuleRecord {
                module: "def_platform".to_string(),
                count: 1,
                method: "default".to_string(),
                equipment: vec![EquipmentRecord {
                    connection: "con_shield_01".to_string(),
                    equipment: "shield_l".to_string(),
                }],
            }],
            settings: SettingsConfig::default(),
        };
        assert!(matches!(
            Station::from_record(station.catalog_handle(), &record),
            Err(StationError::InvalidEquipmentAssignment { .. })
        ));

        let record = StationRecord {
            modules: vec![PlacedModuleRecord {
                module: "no_such_module".to_string(),
                count: 1,
                method: "default".to_string(),
                equipment: vec![],
            }],
            settings: SettingsConfig::default(),
        };
        assert!(matches!(
            Station::from_record(station.catalog_handle(), &record),
            Err(StationError::Catalog(CatalogError::EntityNotFound(_)))
        ));
    }
}
