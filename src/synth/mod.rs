//! Derived weather scenarios used as simulation inputs.

pub mod future;
pub mod heatwave;
pub mod uhi;

pub use future::{UNRELIABLE_HEATWAVE_FIELDS, create_future_heatwave};
pub use heatwave::{HottestDayRule, extend_heatwave, hottest_day_start};
pub use uhi::include_uhi_effect;
