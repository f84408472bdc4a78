use serde::{Deserialize, Serialize};

use crate::analysis::extreme_week::locate_hottest_week;
use crate::error::AnalysisError;
use crate::weather::WeatherSeries;

const HOURS_PER_DAY: usize = 24;

/// How the day to replicate is chosen.
///
/// The two rules pick different days when a heat spike is asymmetric, so
/// the choice is explicit per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HottestDayRule {
    /// Day containing the first hour with the highest dry-bulb temperature.
    #[default]
    PeakHour,
    /// Day with the highest mean temperature within the hottest week.
    WarmestDayOfHottestWeek,
}

/// Index of the first record of the hottest day.
pub fn hottest_day_start(series: &WeatherSeries, rule: HottestDayRule) -> Option<usize> {
    let records = &series.records;
    match rule {
        HottestDayRule::PeakHour => {
            let mut peak: Option<(usize, f64)> = None;
            for (i, r) in records.iter().enumerate() {
                let t = r.dry_bulb_temperature();
                if peak.is_none_or(|(_, best)| t > best) {
                    peak = Some((i, t));
                }
            }
            let (idx, _) = peak?;
            records.iter().position(|r| r.same_day(&records[idx]))
        }
        HottestDayRule::WarmestDayOfHottestWeek => {
            let temps = series.dry_bulb_temperatures();
            let week = locate_hottest_week(&temps)?;
            let n = temps.len();
            let day_mean = |d: usize| {
                let start = week.start_index + d * HOURS_PER_DAY;
                let sum: f64 = (0..HOURS_PER_DAY).map(|h| temps[(start + h) % n]).sum();
                sum / HOURS_PER_DAY as f64
            };
            let mut best = (0, day_mean(0));
            for d in 1..7 {
                let mean = day_mean(d);
                if mean > best.1 {
                    best = (d, mean);
                }
            }
            Some((week.start_index + best.0 * HOURS_PER_DAY) % n)
        }
    }
}

/// Prolongs the hottest day into a heatwave of `days` days.
///
/// The `days - 1` days following the hottest day are overwritten by copies
/// of its 24 records. Copies keep the month and day of the position they
/// land on, so the calendar stays consistent. A heatwave running past the
/// last hour wraps onto the start of the year. The record count never changes.
pub fn extend_heatwave(
    series: &WeatherSeries,
    days: usize,
    rule: HottestDayRule,
) -> Result<WeatherSeries, AnalysisError> {
    let n = series.records.len();
    if days == 0 {
        return Err(AnalysisError::InvalidParameter(
            "heatwave duration must be at least one day".to_string(),
        ));
    }
    if days * HOURS_PER_DAY > n {
        return Err(AnalysisError::InvalidParameter(format!(
            "a {days}-day heatwave does not fit into {n} hours"
        )));
    }
    let start = hottest_day_start(series, rule).ok_or_else(|| {
        AnalysisError::InvalidParameter("cannot extend an empty weather series".to_string())
    })?;

    let hottest: Vec<_> = (0..HOURS_PER_DAY)
        .map(|h| series.records[(start + h) % n].clone())
        .collect();
    let first = &hottest[0];
    tracing::info!(
        "Extending hottest day {:02}/{:02} to {days} days ({rule:?})",
        first.month,
        first.day
    );

    let mut out = series.clone();
    for i in 1..days {
        for (h, record) in hottest.iter().enumerate() {
            let pos = (start + i * HOURS_PER_DAY + h) % n;
            let mut copy = record.clone();
            copy.set_day_from(&series.records[pos]);
            out.records[pos] = copy;
        }
    }
    if start + days * HOURS_PER_DAY > n {
        tracing::debug!(
            "Heatwave wraps {} hours onto the start of the year",
            start + days * HOURS_PER_DAY - n
        );
    }
    Ok(out)
}
