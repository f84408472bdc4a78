//! File I/O around the analysis core.
//!
//! This module reads simulation output tables, limit-curve tables and
//! building models, locates scenario directories and persists results.

pub mod idf;
pub mod layout;
pub mod limit_curve;
pub mod sim_output;
pub mod store;

pub use idf::{Idf, IdfObject};
pub use layout::{ScenarioUnit, discover_units};
pub use limit_curve::load_limit_curves;
pub use sim_output::SimulationOutputTable;
pub use store::{MemoryStore, ResultStore, StoredValue, read_results, write_results};
