use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed module group inside a station.
    pub struct PlacementId;
}

/// Identifies a ware in the catalog. Modules, equipment and ships are wares
/// too, so this is the id space for every tradeable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WareId(pub u32);

/// Identifies a ware group (carries the tier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// Identifies a transport type (container, solid, liquid, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransportTypeId(pub u32);

/// Identifies a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u32);

/// Identifies a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RaceId(pub u32);

/// Identifies a size class (extrasmall, small, medium, large, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SizeId(pub u32);

/// Identifies an equipment type (engines, shields, turrets, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EquipmentTypeId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ware_id_equality() {
        let a = WareId(0);
        let b = WareId(0);
        let c = WareId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ware_ids_order_by_index() {
        let mut ids = vec![WareId(3), WareId(1), WareId(2)];
        ids.sort();
        assert_eq!(ids, vec![WareId(1), WareId(2), WareId(3)]);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(WareId(0), "energycells");
        map.insert(WareId(1), "hullparts");
        assert_eq!(map[&WareId(1)], "hullparts");
    }
}
