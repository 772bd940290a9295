use crate::id::{PlacementId, WareId};
use std::collections::BTreeSet;

/// What a mutation touched.
///
/// Every ledger and station mutation returns one of these instead of firing
/// change notifications. A host redraws exactly the wares and placements
/// listed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changed_wares: BTreeSet<WareId>,
    removed_wares: BTreeSet<WareId>,
    placements: BTreeSet<PlacementId>,
    settings_changed: bool,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a ware whose ledger net amount changed.
    pub fn mark_ware(&mut self, ware: WareId) {
        self.changed_wares.insert(ware);
    }

    /// Mark a ware whose ledger entry disappeared. Also marks it changed.
    pub fn mark_removed(&mut self, ware: WareId) {
        self.changed_wares.insert(ware);
        self.removed_wares.insert(ware);
    }

    /// Mark a placement that was created, resized, re-equipped or removed.
    pub fn mark_placement(&mut self, placement: PlacementId) {
        self.placements.insert(placement);
    }

    pub fn mark_settings(&mut self) {
        self.settings_changed = true;
    }

    /// Returns `true` if nothing was touched.
    pub fn is_empty(&self) -> bool {
        self.changed_wares.is_empty() && self.placements.is_empty() && !self.settings_changed
    }

    pub fn is_ware_changed(&self, ware: WareId) -> bool {
        self.changed_wares.contains(&ware)
    }

    pub fn changed_wares(&self) -> &BTreeSet<WareId> {
        &self.changed_wares
    }

    pub fn removed_wares(&self) -> &BTreeSet<WareId> {
        &self.removed_wares
    }

    pub fn placements(&self) -> &BTreeSet<PlacementId> {
        &self.placements
    }

    pub fn settings_changed(&self) -> bool {
        self.settings_changed
    }

    /// Fold `other` into `self`.
    ///
    /// A ware removed earlier and re-added by `other` is no longer reported
    /// as removed.
    pub fn merge(&mut self, other: ChangeSet) {
        for ware in &other.changed_wares {
            if !other.removed_wares.contains(ware) {
                self.removed_wares.remove(ware);
            }
        }
        self.changed_wares.extend(other.changed_wares);
        self.removed_wares.extend(other.removed_wares);
        self.placements.extend(other.placements);
        self.settings_changed |= other.settings_changed;
    }
}
