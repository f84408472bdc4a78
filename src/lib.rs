pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod key;
pub mod pipeline;
mod run_id;
pub mod synth;
pub mod weather;

// Prelude
pub use config::{AnalysisConfig, RerunPolicy};
pub use error::AnalysisError;
pub use io::{MemoryStore, ResultStore, ScenarioUnit, StoredValue};
pub use key::{Metric, MetricKey, ResultKey};
pub use pipeline::{RunReport, UnitOutcome, analyze_scenario, run_analysis};
pub use run_id::RunId;
pub use synth::{HottestDayRule, create_future_heatwave, extend_heatwave, include_uhi_effect};
pub use weather::{WeatherField, WeatherSeries, read_epw, write_epw};
