//! Hourly weather series and the EPW codec.

pub mod epw;
pub mod field;
pub mod series;
pub mod timestamp;

pub use epw::{read_epw, write_epw};
pub use field::WeatherField;
pub use series::{HOURS_PER_WEEK, HOURS_PER_YEAR, HourlyWeatherRecord, WeatherSeries};
pub use timestamp::Timestamp;
