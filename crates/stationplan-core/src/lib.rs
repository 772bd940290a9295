//! Stationplan Core -- the planning engine for space-station layouts.
//!
//! This crate holds the read-only entity catalog, production formula
//! resolution, efficiency, the product ledger, shortfall resolution
//! (auto-add) and the equipment compatibility matcher, plus the station
//! work area that ties them together.
//!
//! # Data flow
//!
//! 1. **Catalog** -- built once through a [`catalog::CatalogBuilder`] (or a
//!    [`catalog::CatalogSource`]) and shared as `Arc<Catalog>`.
//! 2. **Resolve** -- [`production::resolve_production`] turns a module and a
//!    method into output and inputs per hour, with `"default"` fallback.
//! 3. **Efficiency** -- [`production::efficiency`] scales outputs by the
//!    workforce and sunlight settings.
//! 4. **Ledger** -- [`ledger::ProductLedger`] sums every placed module's
//!    contribution per ware.
//! 5. **Auto-add** -- [`shortfall::compute_needed_modules`] proposes modules
//!    for manufactured wares running short; [`shortfall::AutoAdd`] repeats
//!    it until nothing is short.
//!
//! Equipment checks ([`compat::can_equip`]) are independent of the flow and
//! run whenever equipment is mounted on a connection.
//!
//! # Mutation pattern
//!
//! Mutations return a [`change::ChangeSet`] instead of raising change
//! notifications, and either apply fully or not at all:
//!
//! ```rust,ignore
//! let changes = station.place_modules(&[ModuleOrder::new(module, 3)])?;
//! for ware in changes.changed_wares() {
//!     redraw(station.ledger_entry(*ware));
//! }
//! ```
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Immutable, id-indexed game data.
//! - [`entity::Ware`] -- Base ware shape with a [`entity::WareKind`] payload
//!   for modules, equipment and ships.
//! - [`ledger::ProductLedger`] -- Per-ware net production.
//! - [`station::Station`] -- Placed modules, settings and their ledger.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for exact ledger sums.
//! - [`serialize`] -- Persistence records and versioned bitcode snapshots.

pub mod catalog;
pub mod change;
pub mod command_queue;
pub mod compat;
pub mod config;
pub mod entity;
pub mod fixed;
pub mod id;
pub mod ledger;
pub mod production;
pub mod serialize;
pub mod shortfall;
pub mod station;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
