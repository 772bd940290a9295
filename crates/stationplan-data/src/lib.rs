//! Game data loading for Stationplan.
//!
//! Reads a directory of RON, JSON or TOML tables, resolves name references
//! and builds a [`stationplan_core::catalog::Catalog`].

pub mod files;
pub mod loader;
pub mod schema;

pub use files::DataFile;
pub use loader::{DataDir, DataLoadError, load_catalog, load_planner_config};
