//! The entity catalog: an immutable, id-indexed view of all game data.
//!
//! Built once through [`CatalogBuilder`] (register → attach kinds and rows →
//! [`CatalogBuilder::build`]). Associations are resolved eagerly during the
//! build, so every lookup afterwards is a vector index or a hash lookup.

use crate::compat::fits_slot;
use crate::entity::*;
use crate::id::*;
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },
    #[error("invalid {kind} reference {index} in {context}")]
    InvalidRef {
        kind: &'static str,
        index: u32,
        context: String,
    },
    #[error("ware '{0}' already has a kind payload")]
    KindAlreadySet(String),
    #[error("ware '{ware}' is produced by a module but has no \"default\" recipe")]
    MissingDefaultRecipe { ware: String },
    #[error("ware '{ware}' has more than one recipe for method '{method}'")]
    DuplicateRecipe { ware: String, method: String },
    #[error("recipe '{ware}'/'{method}' has a zero cycle time")]
    InvalidCycleTime { ware: String, method: String },
}

// ---------------------------------------------------------------------------
// Name tables
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Table<T, I> {
    rows: Vec<T>,
    by_name: HashMap<String, I>,
}

impl<T, I: Copy> Table<T, I> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    fn insert(
        &mut self,
        kind: &'static str,
        name: &str,
        row: T,
        make_id: fn(u32) -> I,
    ) -> Result<I, CatalogError> {
        if self.by_name.contains_key(name) {
            return Err(CatalogError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
        let id = make_id(self.rows.len() as u32);
        self.rows.push(row);
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    fn get(&self, index: u32) -> Option<&T> {
        self.rows.get(index as usize)
    }

    fn id(&self, name: &str) -> Option<I> {
        self.by_name.get(name).copied()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Everything needed to register a ware. The kind payload is attached later
/// with [`CatalogBuilder::set_kind`], once every ware it refers to exists.
#[derive(Debug, Clone, Default)]
pub struct WareDef {
    pub name: String,
    pub display_name: String,
    pub group: Option<GroupId>,
    pub transport: Option<TransportTypeId>,
    pub price: PriceRange,
    pub tags: TagSet,
}

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug)]
pub struct CatalogBuilder {
    wares: Table<Ware, WareId>,
    groups: Table<WareGroup, GroupId>,
    transports: Table<TransportType, TransportTypeId>,
    races: Table<Race, RaceId>,
    factions: Table<Faction, FactionId>,
    sizes: Table<Size, SizeId>,
    equipment_types: Table<EquipmentType, EquipmentTypeId>,
    recipes: Vec<ProductionRecipe>,
    requirements: Vec<ResourceRequirement>,
    effects: Vec<Effect>,
    connections: Vec<EquipmentSlot>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            wares: Table::new(),
            groups: Table::new(),
            transports: Table::new(),
            races: Table::new(),
            factions: Table::new(),
            sizes: Table::new(),
            equipment_types: Table::new(),
            recipes: Vec::new(),
            requirements: Vec::new(),
            effects: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn register_group(&mut self, name: &str, tier: u32) -> Result<GroupId, CatalogError> {
        let row = WareGroup {
            name: name.to_string(),
            tier,
        };
        self.groups.insert("ware group", name, row, GroupId)
    }

    pub fn register_transport(&mut self, name: &str) -> Result<TransportTypeId, CatalogError> {
        let row = TransportType {
            name: name.to_string(),
        };
        self.transports
            .insert("transport type", name, row, TransportTypeId)
    }

    pub fn register_race(&mut self, name: &str) -> Result<RaceId, CatalogError> {
        let row = Race {
            name: name.to_string(),
        };
        self.races.insert("race", name, row, RaceId)
    }

    pub fn register_faction(
        &mut self,
        name: &str,
        race: Option<RaceId>,
    ) -> Result<FactionId, CatalogError> {
        let row = Faction {
            name: name.to_string(),
            race,
        };
        self.factions.insert("faction", name, row, FactionId)
    }

    pub fn register_size(&mut self, name: &str) -> Result<SizeId, CatalogError> {
        let row = Size {
            name: name.to_string(),
        };
        self.sizes.insert("size", name, row, SizeId)
    }

    pub fn register_equipment_type(&mut self, name: &str) -> Result<EquipmentTypeId, CatalogError> {
        let row = EquipmentType {
            name: name.to_string(),
        };
        self.equipment_types
            .insert("equipment type", name, row, EquipmentTypeId)
    }

    /// Register a ware with a [`WareKind::Plain`] payload. Returns its id.
    pub fn register_ware(&mut self, def: WareDef) -> Result<WareId, CatalogError> {
        let id = WareId(self.wares.len() as u32);
        let name = def.name.clone();
        let ware = Ware {
            id,
            display_name: if def.display_name.is_empty() {
                def.name.clone()
            } else {
                def.display_name
            },
            name: def.name,
            group: def.group,
            tier: 0,
            transport: def.transport,
            price: def.price,
            tags: def.tags,
            kind: WareKind::Plain,
        };
        self.wares.insert("ware", &name, ware, WareId)
    }

    /// Attach the module, equipment or ship payload of a registered ware.
    pub fn set_kind(&mut self, id: WareId, kind: WareKind) -> Result<(), CatalogError> {
        let ware = self
            .wares
            .rows
            .get_mut(id.0 as usize)
            .ok_or_else(|| CatalogError::InvalidRef {
                kind: "ware",
                index: id.0,
                context: "set_kind".to_string(),
            })?;
        if !matches!(ware.kind, WareKind::Plain) {
            return Err(CatalogError::KindAlreadySet(ware.name.clone()));
        }
        ware.kind = kind;
        Ok(())
    }

    pub fn add_recipe(&mut self, recipe: ProductionRecipe) {
        self.recipes.push(recipe);
    }

    pub fn add_requirement(&mut self, requirement: ResourceRequirement) {
        self.requirements.push(requirement);
    }

    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn add_connection(&mut self, slot: EquipmentSlot) {
        self.connections.push(slot);
    }

    pub fn ware_id(&self, name: &str) -> Option<WareId> {
        self.wares.id(name)
    }

    pub fn ware_names(&self) -> &HashMap<String, WareId> {
        &self.wares.by_name
    }

    pub fn group_names(&self) -> &HashMap<String, GroupId> {
        &self.groups.by_name
    }

    pub fn transport_names(&self) -> &HashMap<String, TransportTypeId> {
        &self.transports.by_name
    }

    pub fn race_names(&self) -> &HashMap<String, RaceId> {
        &self.races.by_name
    }

    pub fn faction_names(&self) -> &HashMap<String, FactionId> {
        &self.factions.by_name
    }

    pub fn size_names(&self) -> &HashMap<String, SizeId> {
        &self.sizes.by_name
    }

    pub fn equipment_type_names(&self) -> &HashMap<String, EquipmentTypeId> {
        &self.equipment_types.by_name
    }

    fn ware_name(&self, id: WareId) -> String {
        self.wares
            .get(id.0)
            .map(|w| w.name.clone())
            .unwrap_or_else(|| format!("#{}", id.0))
    }

    fn check_ware(&self, id: WareId, context: &str) -> Result<(), CatalogError> {
        check_index("ware", id.0, self.wares.len(), context)
    }

    /// Validate every reference and build the immutable catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        self.validate_refs()?;

        let mut recipes: HashMap<WareId, Vec<ProductionRecipe>> = HashMap::new();
        let mut seen_methods: HashSet<(WareId, &str)> = HashSet::new();
        for recipe in &self.recipes {
            if recipe.cycle_time_secs == 0 {
                return Err(CatalogError::InvalidCycleTime {
                    ware: self.ware_name(recipe.ware),
                    method: recipe.method.clone(),
                });
            }
            if !seen_methods.insert((recipe.ware, recipe.method.as_str())) {
                return Err(CatalogError::DuplicateRecipe {
                    ware: self.ware_name(recipe.ware),
                    method: recipe.method.clone(),
                });
            }
            recipes.entry(recipe.ware).or_default().push(recipe.clone());
        }

        let mut producers: HashMap<WareId, Vec<Producer>> = HashMap::new();
        for ware in &self.wares.rows {
            let Some(module) = ware.as_module() else {
                continue;
            };
            for production in &module.productions {
                let has_default = recipes
                    .get(&production.ware)
                    .is_some_and(|rs| rs.iter().any(|r| r.method == DEFAULT_METHOD));
                if !has_default {
                    return Err(CatalogError::MissingDefaultRecipe {
                        ware: self.ware_name(production.ware),
                    });
                }
                producers.entry(production.ware).or_default().push(Producer {
                    module: ware.id,
                    method: production.method.clone(),
                });
            }
        }

        let mut requirements: HashMap<WareId, Vec<ResourceRequirement>> = HashMap::new();
        for req in self.requirements {
            requirements.entry(req.ware).or_default().push(req);
        }

        let mut effects: HashMap<WareId, Vec<Effect>> = HashMap::new();
        for effect in self.effects {
            effects.entry(effect.ware).or_default().push(effect);
        }

        let mut connections: HashMap<WareId, Vec<EquipmentSlot>> = HashMap::new();
        for slot in self.connections {
            connections.entry(slot.owner).or_default().push(slot);
        }

        // Tiers come from the group and are fixed from here on.
        let mut wares = self.wares;
        for ware in &mut wares.rows {
            ware.tier = ware
                .group
                .and_then(|g| self.groups.get(g.0))
                .map(|g| g.tier)
                .unwrap_or(0);
        }

        // Default ship loadouts only keep entries the connection accepts.
        let equipment_snapshot: Vec<Ware> = wares.rows.clone();
        for ware in &mut wares.rows {
            let ship_name = ware.name.clone();
            let owner = ware.id;
            let WareKind::Ship(ship) = &mut ware.kind else {
                continue;
            };
            let slots = connections.get(&owner).map(Vec::as_slice).unwrap_or(&[]);
            for loadout in &mut ship.loadouts {
                loadout.entries.retain(|entry| {
                    let slot = slots.iter().find(|s| s.connection == entry.connection);
                    let equipment = &equipment_snapshot[entry.equipment.0 as usize];
                    let ok = slot.is_some_and(|s| fits_slot(s, equipment));
                    if !ok {
                        tracing::warn!(
                            ship = %ship_name,
                            loadout = %loadout.name,
                            connection = %entry.connection,
                            equipment = %equipment.name,
                            "dropping incompatible loadout entry"
                        );
                    }
                    ok
                });
            }
        }

        let catalog = Catalog {
            wares,
            groups: self.groups,
            transports: self.transports,
            races: self.races,
            factions: self.factions,
            sizes: self.sizes,
            equipment_types: self.equipment_types,
            recipes,
            requirements,
            effects,
            connections,
            producers,
        };
        tracing::info!(
            wares = catalog.ware_count(),
            modules = catalog.all(Capability::Module).count(),
            equipment = catalog.all(Capability::Equipment).count(),
            "catalog built"
        );
        Ok(catalog)
    }

    fn validate_refs(&self) -> Result<(), CatalogError> {
        for ware in &self.wares.rows {
            let ctx = format!("ware '{}'", ware.name);
            if let Some(g) = ware.group {
                check_index("ware group", g.0, self.groups.len(), &ctx)?;
            }
            if let Some(t) = ware.transport {
                check_index("transport type", t.0, self.transports.len(), &ctx)?;
            }
            match &ware.kind {
                WareKind::Plain => {}
                WareKind::Module(module) => {
                    for p in &module.productions {
                        self.check_ware(p.ware, &ctx)?;
                    }
                    for slot in &module.slots {
                        check_index("size", slot.size.0, self.sizes.len(), &ctx)?;
                    }
                    if let Some(t) = module.storage.as_ref().and_then(|s| s.transport) {
                        check_index("transport type", t.0, self.transports.len(), &ctx)?;
                    }
                }
                WareKind::Equipment(eq) => {
                    check_index(
                        "equipment type",
                        eq.equipment_type.0,
                        self.equipment_types.len(),
                        &ctx,
                    )?;
                    if let Some(s) = eq.size {
                        check_index("size", s.0, self.sizes.len(), &ctx)?;
                    }
                    for f in &eq.factions {
                        check_index("faction", f.0, self.factions.len(), &ctx)?;
                    }
                }
                WareKind::Ship(ship) => {
                    if let Some(s) = ship.size {
                        check_index("size", s.0, self.sizes.len(), &ctx)?;
                    }
                    for hangar in &ship.hangars {
                        check_index("size", hangar.size.0, self.sizes.len(), &ctx)?;
                    }
                    for entry in ship.loadouts.iter().flat_map(|l| &l.entries) {
                        self.check_ware(entry.equipment, &ctx)?;
                    }
                }
            }
        }
        for faction in &self.factions.rows {
            if let Some(r) = faction.race {
                let ctx = format!("faction '{}'", faction.name);
                check_index("race", r.0, self.races.len(), &ctx)?;
            }
        }
        for r in &self.recipes {
            self.check_ware(r.ware, "production recipe")?;
        }
        for r in &self.requirements {
            self.check_ware(r.ware, "resource requirement")?;
            self.check_ware(r.needed, "resource requirement")?;
        }
        for e in &self.effects {
            self.check_ware(e.ware, "effect")?;
        }
        for c in &self.connections {
            self.check_ware(c.owner, "connection")?;
            check_index(
                "equipment type",
                c.equipment_type.0,
                self.equipment_types.len(),
                "connection",
            )?;
        }
        Ok(())
    }
}

fn check_index(kind: &'static str, index: u32, len: usize, context: &str) -> Result<(), CatalogError> {
    if (index as usize) < len {
        Ok(())
    } else {
        Err(CatalogError::InvalidRef {
            kind,
            index,
            context: context.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A module able to produce a ware, under the given method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Producer {
    pub module: WareId,
    pub method: String,
}

/// Filters for [`Catalog::all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Ware,
    Module,
    /// Modules with at least one production.
    ProductionModule,
    Equipment,
    Thruster,
    Ship,
}

impl Capability {
    pub fn matches(self, ware: &Ware) -> bool {
        match self {
            Capability::Ware => true,
            Capability::Module => ware.as_module().is_some(),
            Capability::ProductionModule => ware
                .as_module()
                .is_some_and(|m| !m.productions.is_empty()),
            Capability::Equipment => ware.as_equipment().is_some(),
            Capability::Thruster => ware.is_thruster(),
            Capability::Ship => ware.as_ship().is_some(),
        }
    }
}

/// Immutable catalog. Frozen after build(); share it behind an `Arc`.
#[derive(Debug)]
pub struct Catalog {
    wares: Table<Ware, WareId>,
    groups: Table<WareGroup, GroupId>,
    transports: Table<TransportType, TransportTypeId>,
    races: Table<Race, RaceId>,
    factions: Table<Faction, FactionId>,
    sizes: Table<Size, SizeId>,
    equipment_types: Table<EquipmentType, EquipmentTypeId>,
    recipes: HashMap<WareId, Vec<ProductionRecipe>>,
    requirements: HashMap<WareId, Vec<ResourceRequirement>>,
    effects: HashMap<WareId, Vec<Effect>>,
    connections: HashMap<WareId, Vec<EquipmentSlot>>,
    producers: HashMap<WareId, Vec<Producer>>,
}

/// A source of catalog rows, e.g. a directory of data files.
pub trait CatalogSource {
    type Error: From<CatalogError>;

    /// Register every row of the source into `builder`.
    fn populate(&self, builder: &mut CatalogBuilder) -> Result<(), Self::Error>;
}

impl Catalog {
    /// Load everything from `source` and build the indices.
    pub fn load<S: CatalogSource + ?Sized>(source: &S) -> Result<Catalog, S::Error> {
        let mut builder = CatalogBuilder::new();
        source.populate(&mut builder)?;
        Ok(builder.build()?)
    }

    /// Look up a ware by its game data name.
    pub fn get(&self, name: &str) -> Result<&Ware, CatalogError> {
        self.try_get(name)
            .ok_or_else(|| CatalogError::EntityNotFound(name.to_string()))
    }

    pub fn try_get(&self, name: &str) -> Option<&Ware> {
        self.wares.id(name).and_then(|id| self.ware(id))
    }

    pub fn ware(&self, id: WareId) -> Option<&Ware> {
        self.wares.get(id.0)
    }

    /// Like [`ware`](Self::ware), but an unknown id is an error.
    pub fn ware_by_id(&self, id: WareId) -> Result<&Ware, CatalogError> {
        self.ware(id)
            .ok_or_else(|| CatalogError::EntityNotFound(format!("#{}", id.0)))
    }

    pub fn ware_id(&self, name: &str) -> Option<WareId> {
        self.wares.id(name)
    }

    pub fn ware_count(&self) -> usize {
        self.wares.len()
    }

    /// Every ware with the given capability, in registration order.
    pub fn all(&self, capability: Capability) -> impl Iterator<Item = &Ware> + '_ {
        self.wares
            .rows
            .iter()
            .filter(move |w| capability.matches(w))
    }

    pub fn module(&self, id: WareId) -> Option<&ModuleSpec> {
        self.ware(id).and_then(Ware::as_module)
    }

    pub fn tier(&self, id: WareId) -> u32 {
        self.ware(id).map(|w| w.tier).unwrap_or(0)
    }

    pub fn group(&self, id: GroupId) -> Option<&WareGroup> {
        self.groups.get(id.0)
    }

    pub fn transport_type(&self, id: TransportTypeId) -> Option<&TransportType> {
        self.transports.get(id.0)
    }

    pub fn race(&self, id: RaceId) -> Option<&Race> {
        self.races.get(id.0)
    }

    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(id.0)
    }

    pub fn faction_id(&self, name: &str) -> Option<FactionId> {
        self.factions.id(name)
    }

    pub fn size(&self, id: SizeId) -> Option<&Size> {
        self.sizes.get(id.0)
    }

    pub fn size_id(&self, name: &str) -> Option<SizeId> {
        self.sizes.id(name)
    }

    pub fn equipment_type(&self, id: EquipmentTypeId) -> Option<&EquipmentType> {
        self.equipment_types.get(id.0)
    }

    pub fn equipment_type_id(&self, name: &str) -> Option<EquipmentTypeId> {
        self.equipment_types.id(name)
    }

    /// All production recipes of a ware (one per method).
    pub fn recipes(&self, ware: WareId) -> &[ProductionRecipe] {
        self.recipes.get(&ware).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All resource requirements of a ware, across methods.
    pub fn requirements(&self, ware: WareId) -> &[ResourceRequirement] {
        self.requirements.get(&ware).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All effects of a ware, across methods.
    pub fn effects(&self, ware: WareId) -> &[Effect] {
        self.effects.get(&ware).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Connections (equipment slots) of a module or ship.
    pub fn connections(&self, owner: WareId) -> &[EquipmentSlot] {
        self.connections.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn connection(&self, owner: WareId, name: &str) -> Option<&EquipmentSlot> {
        self.connections(owner).iter().find(|s| s.connection == name)
    }

    /// Modules producing `ware`, in catalog order.
    pub fn producers_of(&self, ware: WareId) -> &[Producer] {
        self.producers.get(&ware).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Equipment owned by `faction`.
    pub fn equipment_of_faction(&self, faction: FactionId) -> impl Iterator<Item = &Ware> + '_ {
        self.all(Capability::Equipment).filter(move |w| {
            w.as_equipment()
                .is_some_and(|e| e.factions.contains(&faction))
        })
    }
}
