//! Orchestration of an analysis run.
//!
//! Every (building, scenario) unit is analyzed independently and in parallel.
//! Summer extraction and baseline differences need all scenarios of a
//! building, so they run after every unit has finished. Results are written
//! to the store in unit order.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::analysis::activity::{ActivityClassifier, AgeGroup, LimitCurveSet};
use crate::analysis::comfort::{ComfortSeries, ThermalComfortDeriver, peak_humidex};
use crate::analysis::degree_hours::degree_exceedance;
use crate::analysis::extreme_week::{AnalysisWindow, HottestWeek, locate_hottest_week};
use crate::analysis::summer::{SummerMask, difference};
use crate::config::{AnalysisConfig, RerunPolicy};
use crate::error::AnalysisError;
use crate::io::layout::{OUTPUT_FILE, ScenarioUnit};
use crate::io::sim_output::SimulationOutputTable;
use crate::io::store::{ResultStore, StoredValue};
use crate::key::{Metric, MetricKey, ResultKey};
use crate::weather::{Timestamp, WeatherSeries, read_epw};

type Entry = (ResultKey, StoredValue);

/// Everything derived from one unit, kept until the building's scenarios are joined.
#[derive(Debug, Clone)]
pub struct ScenarioResults {
    pub building: String,
    pub scenario: String,
    pub hottest_week: HottestWeek,
    /// Output timestamp of the first hour of the hottest week.
    pub hottest_week_start: Timestamp,
    /// Normalized output timestamps.
    pub timestamps: Vec<Timestamp>,
    pub zones: BTreeMap<String, ComfortSeries>,
    /// Per-zone results ready for the store.
    pub entries: Vec<Entry>,
}

/// Analyzes one (building, scenario) unit.
///
/// The weather series and simulation output must be aligned hour by hour.
pub fn analyze_scenario(
    building: &str,
    scenario: &str,
    weather: &WeatherSeries,
    table: &SimulationOutputTable,
    config: &AnalysisConfig,
    curves: &LimitCurveSet,
) -> Result<ScenarioResults, AnalysisError> {
    if table.len() != weather.num_hours() {
        return Err(AnalysisError::shape(
            building,
            scenario,
            format!(
                "weather has {} hours, simulation output has {}",
                weather.num_hours(),
                table.len()
            ),
        ));
    }
    let hottest_week = locate_hottest_week(&weather.dry_bulb_temperatures())
        .ok_or_else(|| AnalysisError::shape(building, scenario, "weather series is empty"))?;

    let timestamps = table.timestamps().to_vec();
    let hottest_week_start = timestamps[hottest_week.start_index];
    info!(
        "{building}/{scenario}: hottest week starts {hottest_week_start} (mean {:.1} °C)",
        hottest_week.mean_temperature
    );

    let window = AnalysisWindow::around(hottest_week.start_index, timestamps.len());
    let daytime: Vec<usize> = window
        .hottest_week_indices()
        .filter(|&i| config.is_daytime(timestamps[i].hour))
        .collect();

    let zones = table.zones();
    if zones.is_empty() {
        return Err(AnalysisError::shape(
            building,
            scenario,
            "no zone reports all thermal comfort variables",
        ));
    }

    let deriver = ThermalComfortDeriver::new(config.indoor_air_speed_m_per_s);
    let classifiers = AgeGroup::ALL
        .iter()
        .map(|&group| Ok((group, ActivityClassifier::new(curves, group)?)))
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    let mut entries = Vec::new();
    let mut series = BTreeMap::new();
    for zone in zones {
        let raw = table.zone_series(building, scenario, &zone)?;
        let comfort = deriver
            .derive(&raw)
            .map_err(|e| AnalysisError::shape(building, scenario, format!("{zone}: {e}")))?;

        let key = |metric| ResultKey::new(building, &zone, scenario, metric);
        for metric in Metric::ALL {
            let values = comfort.get(metric);
            entries.push((key(MetricKey::Annual(metric)), StoredValue::Series(values.to_vec())));
            entries.push((
                key(MetricKey::HottestWeeks(metric)),
                StoredValue::Series(window.extract(values)),
            ));
        }
        for &metric in &config.degree_hour_metrics {
            let Some(threshold) = config.threshold(metric) else {
                continue;
            };
            let record = degree_exceedance(comfort.get(metric), threshold);
            entries.push((
                key(MetricKey::DegreeExceedance(metric)),
                StoredValue::DegreeExceedance(record),
            ));
        }
        for (group, classifier) in &classifiers {
            let samples = daytime
                .iter()
                .map(|&i| (comfort.temperature[i], comfort.relative_humidity[i]));
            let tally = classifier.tally(samples)?;
            entries.push((key(MetricKey::Activity(*group)), StoredValue::Activity(tally)));
        }
        if let Some(peak) = peak_humidex(&comfort) {
            entries.push((key(MetricKey::PeakHumidex), StoredValue::PeakHumidex(peak)));
        }
        series.insert(zone, comfort);
    }

    Ok(ScenarioResults {
        building: building.to_string(),
        scenario: scenario.to_string(),
        hottest_week,
        hottest_week_start,
        timestamps,
        zones: series,
        entries,
    })
}

/// Summer-month series of a scenario and, unless it is the baseline, its
/// difference to the baseline.
///
/// The summer hours are selected on the baseline's timestamps so both
/// series cover the same hours. Without a baseline the scenario's own
/// timestamps are used and no differences are produced.
pub fn summer_entries(
    results: &ScenarioResults,
    baseline: Option<&ScenarioResults>,
    config: &AnalysisConfig,
) -> Result<Vec<Entry>, AnalysisError> {
    let reference = baseline.unwrap_or(results);
    let mask = SummerMask::from_timestamps(&reference.timestamps, &config.summer_months);
    let is_baseline = results.scenario == config.baseline_scenario;
    let shape_err =
        |e: AnalysisError| AnalysisError::shape(&results.building, &results.scenario, e.to_string());

    let mut entries = Vec::new();
    for (zone, comfort) in &results.zones {
        let base_zone = match baseline {
            Some(b) if !is_baseline => {
                let found = b.zones.get(zone);
                if found.is_none() {
                    warn!(
                        "{}/{}: zone {zone} is missing from baseline '{}'",
                        results.building, results.scenario, b.scenario
                    );
                }
                found
            }
            _ => None,
        };

        let key = |metric| ResultKey::new(&results.building, zone, &results.scenario, metric);
        for metric in Metric::ALL {
            let summer = mask.apply(comfort.get(metric)).map_err(shape_err)?;
            if let Some(base) = base_zone {
                let base_summer = mask.apply(base.get(metric)).map_err(shape_err)?;
                let diff = difference(&summer, &base_summer).map_err(shape_err)?;
                entries.push((key(MetricKey::SummerDifference(metric)), StoredValue::Series(diff)));
            }
            entries.push((key(MetricKey::Summer(metric)), StoredValue::Series(summer)));
        }
    }
    Ok(entries)
}

/// Outcome of one unit in a run.
#[derive(Debug)]
pub enum UnitOutcome {
    Completed { zones: usize, results: usize },
    /// No engine output and the rerun policy allows skipping.
    Skipped { reason: String },
    Failed(AnalysisError),
}

#[derive(Debug)]
pub struct UnitReport {
    pub building: String,
    pub scenario: String,
    pub outcome: UnitOutcome,
}

/// Per-unit outcomes of a run, in unit order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub units: Vec<UnitReport>,
}

impl RunReport {
    pub fn completed(&self) -> impl Iterator<Item = &UnitReport> {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::Completed { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &UnitReport> {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &UnitReport> {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::Failed(_)))
    }
}

enum Prepared {
    Analyzed(Box<ScenarioResults>),
    Skipped(String),
}

fn prepare_unit(
    unit: &ScenarioUnit,
    config: &AnalysisConfig,
    curves: &LimitCurveSet,
) -> Result<Prepared, AnalysisError> {
    if !unit.has_output() {
        return match config.rerun_policy {
            RerunPolicy::SkipMissing => Ok(Prepared::Skipped(format!("no {OUTPUT_FILE} yet"))),
            RerunPolicy::FailOnMissing => Err(AnalysisError::MissingOutput {
                building: unit.building.clone(),
                scenario: unit.scenario.clone(),
                path: unit.output_path(),
            }),
        };
    }
    let weather = read_epw(&unit.weather_path()).map_err(|e| {
        AnalysisError::shape(
            &unit.building,
            &unit.scenario,
            format!("cannot read weather file: {e:#}"),
        )
    })?;
    let table = SimulationOutputTable::read(&unit.output_path())?;
    let results = analyze_scenario(&unit.building, &unit.scenario, &weather, &table, config, curves)?;
    Ok(Prepared::Analyzed(Box::new(results)))
}

/// Writes all entries of a unit or none of them.
fn write_entries<S: ResultStore>(store: &mut S, entries: Vec<Entry>) -> Result<usize, AnalysisError> {
    let mut keys = HashSet::with_capacity(entries.len());
    for (key, _) in &entries {
        if store.contains(key) || !keys.insert(key) {
            return Err(AnalysisError::DuplicateKey(key.to_string()));
        }
    }
    let n = entries.len();
    for (key, value) in entries {
        store.put(key, value)?;
    }
    Ok(n)
}

/// Analyzes all units and writes their results to `store`.
///
/// Unit failures are reported in the returned [`RunReport`] and do not stop
/// other units. Reference-data errors (limit curves) abort the run before
/// anything is written.
pub fn run_analysis<S: ResultStore>(
    units: &[ScenarioUnit],
    config: &AnalysisConfig,
    curves: &LimitCurveSet,
    store: &mut S,
) -> Result<RunReport, AnalysisError> {
    config.validate()?;
    curves.validate()?;
    info!("Analyzing {} scenario units", units.len());

    let mut prepared: Vec<Result<Prepared, AnalysisError>> = units
        .par_iter()
        .map(|unit| prepare_unit(unit, config, curves))
        .collect();

    if let Some(pos) = prepared
        .iter()
        .position(|r| matches!(r, Err(e) if e.is_fatal_for_run()))
        && let Err(e) = prepared.swap_remove(pos)
    {
        error!("Aborting run: {e}");
        return Err(e);
    }

    // Join barrier: summer data of a building needs all of its scenarios.
    let mut by_building: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, unit) in units.iter().enumerate() {
        by_building.entry(unit.building.as_str()).or_default().push(i);
    }
    let mut summer: Vec<Option<Result<Vec<Entry>, AnalysisError>>> =
        (0..units.len()).map(|_| None).collect();
    for (building, indices) in &by_building {
        let baseline = indices.iter().find_map(|&i| match &prepared[i] {
            Ok(Prepared::Analyzed(r)) if r.scenario == config.baseline_scenario => Some(r.as_ref()),
            _ => None,
        });
        if baseline.is_none() {
            warn!(
                "{building}: baseline scenario '{}' is not available, summer differences are skipped",
                config.baseline_scenario
            );
        }
        for &i in indices {
            if let Ok(Prepared::Analyzed(r)) = &prepared[i] {
                summer[i] = Some(summer_entries(r, baseline, config));
            }
        }
    }

    let mut report = RunReport::default();
    for ((unit, prepared), summer) in units.iter().zip(prepared).zip(summer) {
        let outcome = match prepared {
            Ok(Prepared::Skipped(reason)) => {
                warn!("{}/{}: skipped, {reason}", unit.building, unit.scenario);
                UnitOutcome::Skipped { reason }
            }
            Err(e) => UnitOutcome::Failed(e),
            Ok(Prepared::Analyzed(results)) => {
                let zones = results.zones.len();
                let mut entries = results.entries;
                match summer {
                    Some(Err(e)) => UnitOutcome::Failed(e),
                    other => {
                        if let Some(Ok(extra)) = other {
                            entries.extend(extra);
                        }
                        match write_entries(store, entries) {
                            Ok(results) => UnitOutcome::Completed { zones, results },
                            Err(e) => UnitOutcome::Failed(e),
                        }
                    }
                }
            }
        };
        if let UnitOutcome::Failed(e) = &outcome {
            error!("{}/{}: {e}", unit.building, unit.scenario);
        }
        report.units.push(UnitReport {
            building: unit.building.clone(),
            scenario: unit.scenario.clone(),
            outcome,
        });
    }

    info!(
        "Run finished: {} completed, {} skipped, {} failed",
        report.completed().count(),
        report.skipped().count(),
        report.failed().count()
    );
    Ok(report)
}
