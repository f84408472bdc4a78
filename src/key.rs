use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::activity::AgeGroup;

/// Hourly quantities produced per zone and scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    Temperature,
    RelativeHumidity,
    Humidex,
    #[serde(rename = "SET")]
    Set,
    #[serde(rename = "PMV")]
    Pmv,
    #[serde(rename = "WBGT")]
    Wbgt,
}

impl Metric {
    /// Every stored hourly series (the comfort indices plus relative humidity).
    pub const ALL: [Metric; 6] = [
        Metric::Temperature,
        Metric::RelativeHumidity,
        Metric::Humidex,
        Metric::Set,
        Metric::Pmv,
        Metric::Wbgt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::RelativeHumidity => "Relative Humidity",
            Metric::Humidex => "Humidex",
            Metric::Set => "SET",
            Metric::Pmv => "PMV",
            Metric::Wbgt => "WBGT",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stored value represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKey {
    /// Full-year hourly series.
    Annual(Metric),
    /// Summer-month hourly series.
    Summer(Metric),
    /// Element-wise summer difference to the baseline scenario.
    SummerDifference(Metric),
    /// Three-week window around the hottest week.
    HottestWeeks(Metric),
    /// Degree-hours / exceedance-hours tuple.
    DegreeExceedance(Metric),
    /// Activity tally over the daytime hours of the hottest week.
    Activity(AgeGroup),
    /// Maximum humidex with the conditions it occurred at.
    PeakHumidex,
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKey::Annual(m) => write!(f, "annual/{m}"),
            MetricKey::Summer(m) => write!(f, "summer/{m}"),
            MetricKey::SummerDifference(m) => write!(f, "summer_difference/{m}"),
            MetricKey::HottestWeeks(m) => write!(f, "hottest_weeks/{m}"),
            MetricKey::DegreeExceedance(m) => write!(f, "dh_eh/{m}"),
            MetricKey::Activity(g) => write!(f, "activity/{g}"),
            MetricKey::PeakHumidex => f.write_str("peak/Humidex"),
        }
    }
}

/// Composite key `(building, zone, weather scenario, metric)` of the flat result map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultKey {
    pub building: String,
    pub zone: String,
    pub scenario: String,
    pub metric: MetricKey,
}

impl ResultKey {
    pub fn new(building: &str, zone: &str, scenario: &str, metric: MetricKey) -> Self {
        Self {
            building: building.to_string(),
            zone: zone.to_string(),
            scenario: scenario.to_string(),
            metric,
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.building, self.zone, self.scenario, self.metric
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display_matches_path_convention() {
        let key = ResultKey::new("house", "LIVING", "tmy", MetricKey::Annual(Metric::Humidex));
        assert_eq!(key.to_string(), "house/LIVING/tmy/annual/Humidex");

        let key = ResultKey::new("house", "LIVING", "hw", MetricKey::Activity(AgeGroup::Elderly));
        assert_eq!(key.to_string(), "house/LIVING/hw/activity/elderly");
    }

    #[test]
    fn test_keys_order_by_building_first() {
        let a = ResultKey::new("a", "z", "s", MetricKey::PeakHumidex);
        let b = ResultKey::new("b", "a", "a", MetricKey::PeakHumidex);
        assert!(a < b);
    }

    #[test]
    fn test_metric_serde_names() {
        let json = serde_json::to_string(&Metric::Set).unwrap();
        assert_eq!(json, "\"SET\"");
        let m: Metric = serde_json::from_str("\"WBGT\"").unwrap();
        assert_eq!(m, Metric::Wbgt);
    }
}
