//! Hourly simulation output table (`eplusout.csv`).
//!
//! Columns are named `<ZONE>:<Variable> [unit](Hourly)`; the first column is
//! `Date/Time` formatted `MM/DD  HH:MM:SS` with hour 24 meaning end of day.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::analysis::comfort::ZoneRawSeries;
use crate::error::AnalysisError;
use crate::weather::Timestamp;

pub const ZONE_MEAN_AIR_TEMPERATURE: &str = "Zone Mean Air Temperature";
pub const ZONE_AIR_RELATIVE_HUMIDITY: &str = "Zone Air Relative Humidity";
pub const ZONE_SET: &str = "Zone Thermal Comfort Pierce Model Standard Effective Temperature";
pub const ZONE_PMV: &str = "Zone Thermal Comfort Fanger Model PMV";
pub const ZONE_MEAN_RADIANT_TEMPERATURE: &str = "Zone Thermal Comfort Mean Radiant Temperature";

/// Variables a zone must report to be analyzed.
pub const REQUIRED_VARIABLES: [&str; 5] = [
    ZONE_MEAN_AIR_TEMPERATURE,
    ZONE_AIR_RELATIVE_HUMIDITY,
    ZONE_SET,
    ZONE_PMV,
    ZONE_MEAN_RADIANT_TEMPERATURE,
];

const DATE_TIME_COLUMN: &str = "Date/Time";

/// Splits `"LIVING:Zone Mean Air Temperature [C](Hourly)"` into
/// `("LIVING", "Zone Mean Air Temperature")`.
fn split_header(header: &str) -> Option<(String, String)> {
    let (zone, rest) = header.trim().rsplit_once(':')?;
    let variable = rest
        .split(['[', '('])
        .next()
        .unwrap_or(rest)
        .trim();
    if zone.trim().is_empty() || variable.is_empty() {
        return None;
    }
    Some((zone.trim().to_string(), variable.to_string()))
}

/// Parsed output table with normalized timestamps.
#[derive(Debug, Clone, Default)]
pub struct SimulationOutputTable {
    timestamps: Vec<Timestamp>,
    columns: BTreeMap<(String, String), Vec<f64>>,
}

impl SimulationOutputTable {
    /// Reads an output table from a CSV file.
    pub fn read(path: &Path) -> Result<Self, AnalysisError> {
        let file = std::fs::File::open(path).map_err(|e| AnalysisError::io(path, e))?;
        Self::from_reader(file, path)
    }

    /// Parses an output table; `source` is only used in error messages.
    pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Self, AnalysisError> {
        let parse_err = |line: usize, detail: String| AnalysisError::Parse {
            file: PathBuf::from(source),
            line,
            detail,
        };

        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| parse_err(1, e.to_string()))?
            .clone();

        let date_col = headers
            .iter()
            .position(|h| h.trim() == DATE_TIME_COLUMN)
            .ok_or_else(|| parse_err(1, format!("no '{DATE_TIME_COLUMN}' column")))?;

        // Column index -> (zone, variable); the first of duplicated headers wins.
        let mut table = Self::default();
        let mut layout: Vec<(usize, (String, String))> = Vec::new();
        for (i, h) in headers.iter().enumerate() {
            if i == date_col {
                continue;
            }
            let Some(key) = split_header(h) else {
                continue;
            };
            if table.columns.contains_key(&key) {
                tracing::warn!("Ignoring duplicate output column '{h}' in {}", source.display());
                continue;
            }
            table.columns.insert(key.clone(), Vec::new());
            layout.push((i, key));
        }

        for (row_idx, row) in rdr.records().enumerate() {
            // Header is line 1.
            let line = row_idx + 2;
            let row = row.map_err(|e| parse_err(line, e.to_string()))?;
            let stamp = row.get(date_col).unwrap_or_default();
            let ts = Timestamp::parse_date_time(stamp)
                .ok_or_else(|| parse_err(line, format!("invalid timestamp '{stamp}'")))?;
            table.timestamps.push(ts);

            for (col, key) in &layout {
                let cell = row.get(*col).unwrap_or_default().trim();
                let value = if cell.is_empty() {
                    f64::NAN
                } else {
                    cell.parse::<f64>().map_err(|_| {
                        parse_err(line, format!("invalid number '{cell}' in {}:{}", key.0, key.1))
                    })?
                };
                if let Some(values) = table.columns.get_mut(key) {
                    values.push(value);
                }
            }
        }

        tracing::debug!(
            "Read {} hours and {} columns from {}",
            table.timestamps.len(),
            table.columns.len(),
            source.display()
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Normalized timestamps, one per row.
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn column(&self, zone: &str, variable: &str) -> Option<&[f64]> {
        self.columns
            .get(&(zone.to_string(), variable.to_string()))
            .map(Vec::as_slice)
    }

    /// Zones reporting every required variable, sorted by name.
    pub fn zones(&self) -> Vec<String> {
        let candidates: BTreeSet<&String> = self.columns.keys().map(|(zone, _)| zone).collect();
        let mut zones = Vec::new();
        for zone in candidates {
            let missing: Vec<&str> = REQUIRED_VARIABLES
                .iter()
                .copied()
                .filter(|v| !self.columns.contains_key(&(zone.clone(), v.to_string())))
                .collect();
            if missing.is_empty() {
                zones.push(zone.clone());
            } else {
                tracing::debug!("Zone {zone} is not analyzed, missing {}", missing.join(", "));
            }
        }
        zones
    }

    /// Raw comfort inputs of one zone.
    pub fn zone_series(
        &self,
        building: &str,
        scenario: &str,
        zone: &str,
    ) -> Result<ZoneRawSeries, AnalysisError> {
        let get = |variable: &str| -> Result<Vec<f64>, AnalysisError> {
            let values = self.column(zone, variable).ok_or_else(|| AnalysisError::MissingColumn {
                building: building.to_string(),
                scenario: scenario.to_string(),
                zone: zone.to_string(),
                variable: variable.to_string(),
            })?;
            if let Some(i) = values.iter().position(|v| v.is_nan()) {
                return Err(AnalysisError::shape(
                    building,
                    scenario,
                    format!("{zone}:{variable} has no value at row {i}"),
                ));
            }
            Ok(values.to_vec())
        };

        Ok(ZoneRawSeries {
            temperature: get(ZONE_MEAN_AIR_TEMPERATURE)?,
            relative_humidity: get(ZONE_AIR_RELATIVE_HUMIDITY)?,
            mean_radiant_temperature: get(ZONE_MEAN_RADIANT_TEMPERATURE)?,
            set: get(ZONE_SET)?,
            pmv: get(ZONE_PMV)?,
        })
    }
}
