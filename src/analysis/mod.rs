//! Time-series analytics over one year of zone conditions.

pub mod activity;
pub mod comfort;
pub mod degree_hours;
pub mod extreme_week;
pub mod summer;

pub use activity::{
    ActivityBand, ActivityClassifier, ActivityTally, AgeGroup, LimitCurve, LimitCurveSet, LimitKind,
};
pub use comfort::{ComfortSeries, PeakHumidex, ThermalComfortDeriver, ZoneRawSeries, peak_humidex};
pub use degree_hours::{DegreeExceedanceRecord, degree_exceedance};
pub use extreme_week::{AnalysisWindow, HottestWeek, HottestWeekStart, locate_hottest_week, locate_in_weather};
pub use summer::{SummerMask, difference};
