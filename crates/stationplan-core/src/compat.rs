//! Equipment compatibility: which equipment may occupy which connection.

use crate::catalog::Catalog;
use crate::entity::{EquipmentSlot, TagSet, Ware};

/// Tag carried by every equipment macro; never meaningful for matching.
const COMPONENT_TAG: &str = "component";
/// Carried by thrusters but absent from the slots that accept them.
const THRUSTER_TAG: &str = "thruster";

/// Returns `true` if every meaningful tag of `equipment` is present in
/// `slot_tags`.
///
/// `"component"` is never meaningful. Thrusters additionally ignore
/// `"thruster"`; no other equipment kind has an exception.
pub fn can_equip(slot_tags: &TagSet, equipment: &Ware) -> bool {
    let thruster = equipment.is_thruster();
    equipment
        .tags
        .iter()
        .filter(|tag| tag.as_str() != COMPONENT_TAG)
        .filter(|tag| !(thruster && tag.as_str() == THRUSTER_TAG))
        .all(|tag| slot_tags.contains(tag))
}

/// Returns `true` if `equipment` is equipment of the slot's type and passes
/// [`can_equip`].
pub fn fits_slot(slot: &EquipmentSlot, equipment: &Ware) -> bool {
    match equipment.as_equipment() {
        Some(spec) => spec.equipment_type == slot.equipment_type && can_equip(&slot.tags, equipment),
        None => false,
    }
}

/// All catalog equipment that may be mounted on `slot`, in catalog order.
pub fn equippable<'a>(catalog: &'a Catalog, slot: &EquipmentSlot) -> Vec<&'a Ware> {
    catalog
        .all(crate::catalog::Capability::Equipment)
        .filter(|ware| fits_slot(slot, ware))
        .collect()
}
