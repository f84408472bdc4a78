use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::comfort::DEFAULT_AIR_SPEED;
use crate::error::AnalysisError;
use crate::key::Metric;
use crate::synth::HottestDayRule;

/// What to do when a (building, scenario) unit has no engine output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerunPolicy {
    /// Report the unit as skipped and continue with the others (partial re-runs).
    #[default]
    SkipMissing,
    /// Report the unit as failed.
    FailOnMissing,
}

/// Configuration of one analysis run.
///
/// Passed explicitly into every stage; nothing reads configuration from
/// global state, so independent runs can proceed concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Threshold per metric for degree-hours and exceedance-hours.
    ///
    /// Defaults: Humidex 35, SET 30 °C, Temperature 30 °C, PMV 1.5, WBGT 23 °C.
    pub thresholds: BTreeMap<Metric, f64>,
    /// Metrics for which degree/exceedance hours are produced.
    pub degree_hour_metrics: Vec<Metric>,
    /// Summer month numbers (1-12). Need not be contiguous in calendar
    /// order (e.g. `[12, 1, 2]`).
    pub summer_months: Vec<u8>,
    /// Scenario the summer differences are taken against.
    pub baseline_scenario: String,
    /// Indoor air speed used for the black globe temperature (m/s).
    pub indoor_air_speed_m_per_s: f64,
    /// First and last daytime hour (inclusive) counted by the activity tally.
    pub daytime_hours: (u8, u8),
    pub rerun_policy: RerunPolicy,
    /// Day replicated by heatwave prolongation.
    pub hottest_day_rule: HottestDayRule,
}

impl AnalysisConfig {
    pub fn new() -> Self {
        let thresholds = BTreeMap::from([
            (Metric::Humidex, 35.0),
            (Metric::Set, 30.0),
            (Metric::Temperature, 30.0),
            (Metric::Pmv, 1.5),
            (Metric::Wbgt, 23.0),
        ]);
        Self {
            thresholds,
            degree_hour_metrics: vec![Metric::Humidex, Metric::Set, Metric::Temperature],
            summer_months: vec![6, 7, 8],
            baseline_scenario: "tmy".to_string(),
            indoor_air_speed_m_per_s: DEFAULT_AIR_SPEED,
            daytime_hours: (6, 22),
            rerun_policy: RerunPolicy::SkipMissing,
            hottest_day_rule: HottestDayRule::PeakHour,
        }
    }

    /// Reads a JSON configuration file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn threshold(&self, metric: Metric) -> Option<f64> {
        self.thresholds.get(&metric).copied()
    }

    /// Whether an hour of day (0-23) counts as daytime.
    pub fn is_daytime(&self, hour: u8) -> bool {
        (self.daytime_hours.0..=self.daytime_hours.1).contains(&hour)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if let Some(m) = self.summer_months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(AnalysisError::InvalidParameter(format!(
                "summer month {m} is outside 1..=12"
            )));
        }
        for (metric, t) in &self.thresholds {
            if !t.is_finite() {
                return Err(AnalysisError::InvalidParameter(format!(
                    "threshold for {metric} is not finite"
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for metric in &self.degree_hour_metrics {
            if !self.thresholds.contains_key(metric) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "no threshold configured for {metric}"
                )));
            }
            if !seen.insert(metric) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "degree-hour metric {metric} is listed more than once"
                )));
            }
        }
        if !(self.indoor_air_speed_m_per_s >= 0.0 && self.indoor_air_speed_m_per_s.is_finite()) {
            return Err(AnalysisError::InvalidParameter(format!(
                "indoor air speed must be a non-negative number, got {}",
                self.indoor_air_speed_m_per_s
            )));
        }
        let (first, last) = self.daytime_hours;
        if first > last || last > 23 {
            return Err(AnalysisError::InvalidParameter(format!(
                "daytime hours {first}..={last} are not a range within a day"
            )));
        }
        if self.baseline_scenario.trim().is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "baseline scenario must be named".to_string(),
            ));
        }
        Ok(())
    }

    /// Logs the effective configuration.
    pub fn log_config(&self) {
        tracing::info!("Analysis configuration:");
        for (metric, t) in &self.thresholds {
            tracing::info!("  threshold {:<12}: {t}", metric.as_str());
        }
        tracing::info!("  summer months       : {:?}", self.summer_months);
        tracing::info!("  baseline scenario   : {}", self.baseline_scenario);
        tracing::info!("  indoor air speed    : {} m/s", self.indoor_air_speed_m_per_s);
        tracing::info!("  rerun policy        : {:?}", self.rerun_policy);
        tracing::info!("  hottest day rule    : {:?}", self.hottest_day_rule);
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new()
    }
}
