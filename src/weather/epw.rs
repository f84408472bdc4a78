//! EPW (EnergyPlus Weather) file I/O.
//!
//! EPW format: 8 header lines followed by hourly data rows with 35
//! comma-separated fields. Header lines and untouched values are written
//! back exactly as read.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::field::{FIRST_VALUE_COLUMN, NUM_FIELDS};
use super::series::{Cell, HourlyWeatherRecord, MISSING_CODES, WeatherSeries};

const NUM_HEADER_LINES: usize = 8;

impl WeatherSeries {
    /// Parses EPW file content.
    pub fn from_epw(content: &str) -> Result<Self> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() < NUM_HEADER_LINES + 1 {
            anyhow::bail!("EPW file too short: expected at least 9 lines");
        }

        // Format: LOCATION,city,state_province,country,source,WMO,lat,lon,tz,elevation
        let location_fields: Vec<&str> = lines[0].split(',').collect();
        if location_fields.len() < 10 {
            anyhow::bail!("Invalid LOCATION header");
        }

        let location = format!(
            "{}, {}",
            location_fields[1].trim(),
            location_fields[3].trim()
        );
        let latitude: f64 = location_fields[6]
            .trim()
            .parse()
            .context("Invalid latitude")?;
        let longitude: f64 = location_fields[7]
            .trim()
            .parse()
            .context("Invalid longitude")?;
        let timezone: f64 = location_fields[8]
            .trim()
            .parse()
            .context("Invalid timezone")?;
        let elevation: f64 = location_fields[9]
            .trim()
            .parse()
            .context("Invalid elevation")?;

        let header = lines[..NUM_HEADER_LINES]
            .iter()
            .map(|l| l.to_string())
            .collect();

        let mut records = Vec::with_capacity(lines.len() - NUM_HEADER_LINES);
        for (i, line) in lines.iter().enumerate().skip(NUM_HEADER_LINES) {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = i + 1;
            records.push(parse_record(line).with_context(|| format!("Invalid EPW row at line {line_no}"))?);
        }

        Ok(Self::from_parts(
            location, latitude, longitude, timezone, elevation, header, records,
        ))
    }

    /// Renders the series in EPW format.
    pub fn to_epw_string(&self) -> String {
        let mut out = String::with_capacity(self.records.len() * 160);
        for line in &self.header {
            out.push_str(line);
            out.push('\n');
        }
        for r in &self.records {
            for column in r.date_columns() {
                out.push_str(&column);
                out.push(',');
            }
            out.push_str(&r.data_source);
            for cell in &r.values {
                out.push(',');
                out.push_str(&cell.render());
            }
            out.push('\n');
        }
        out
    }
}

fn parse_record(line: &str) -> Result<HourlyWeatherRecord> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < NUM_FIELDS {
        anyhow::bail!("expected {NUM_FIELDS} fields, found {}", fields.len());
    }

    // Numbers of the date columns; their text is kept for writing back.
    let year = fields[0].trim().parse().context("Invalid year")?;
    let month = fields[1].trim().parse().context("Invalid month")?;
    let day = fields[2].trim().parse().context("Invalid day")?;
    let hour = fields[3].trim().parse().context("Invalid hour")?;
    let minute = fields[4].trim().parse().context("Invalid minute")?;

    let mut values = Vec::with_capacity(NUM_FIELDS - FIRST_VALUE_COLUMN);
    for (col, text) in fields.iter().enumerate().take(NUM_FIELDS).skip(FIRST_VALUE_COLUMN) {
        // An empty cell stands for the field's missing code and stays empty on write.
        let value: f64 = if text.trim().is_empty() {
            MISSING_CODES[col - FIRST_VALUE_COLUMN]
        } else {
            text.trim()
                .parse()
                .with_context(|| format!("Invalid value '{text}' in column {}", col + 1))?
        };
        values.push(Cell::parsed(value, text));
    }
    let date_text = std::array::from_fn(|i| Some(fields[i].to_string()));

    Ok(HourlyWeatherRecord::from_parts(
        year,
        month,
        day,
        hour,
        minute,
        fields[5].to_string(),
        values,
        date_text,
    ))
}

/// Reads an EPW file from disk.
pub fn read_epw(path: &Path) -> Result<WeatherSeries> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read weather file: {}", path.display()))?;
    WeatherSeries::from_epw(&content)
        .with_context(|| format!("Failed to parse weather file: {}", path.display()))
}

/// Writes a weather series to an EPW file.
pub fn write_epw(path: &Path, series: &WeatherSeries) -> Result<()> {
    fs::write(path, series.to_epw_string())
        .with_context(|| format!("Failed to write weather file: {}", path.display()))
}
