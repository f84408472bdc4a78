use super::field::{NUM_VALUE_FIELDS, WeatherField};
use super::timestamp::Timestamp;

/// Hours in a non-leap weather year.
pub const HOURS_PER_YEAR: usize = 8760;

/// Hours in one analysis week.
pub const HOURS_PER_WEEK: usize = 7 * 24;

/// Numeric weather value that remembers the text it was read from.
///
/// Unmodified values are written back with their original text, so fields the
/// analysis never touches survive a read/write round trip byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cell {
    value: f64,
    text: Option<String>,
}

impl Cell {
    pub(crate) fn parsed(value: f64, text: &str) -> Self {
        Self {
            value,
            text: Some(text.to_string()),
        }
    }

    fn synthesized(value: f64) -> Self {
        Self { value, text: None }
    }

    pub(crate) fn value(&self) -> f64 {
        self.value
    }

    fn set(&mut self, value: f64) {
        if value.to_bits() != self.value.to_bits() {
            self.value = value;
            self.text = None;
        }
    }

    pub(crate) fn render(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => format_value(self.value),
        }
    }
}

/// Formats a modified value, dropping floating point noise below 1e-6.
fn format_value(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    // Avoid "-0" in the output.
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

/// EPW "missing" codes, used for fields a synthetic record does not model
/// and for empty cells of a parsed file.
pub(crate) const MISSING_CODES: [f64; NUM_VALUE_FIELDS] = [
    99.9,        // dry bulb
    99.9,        // dew point
    999.0,       // relative humidity
    999999.0,    // station pressure
    9999.0,      // extraterrestrial horizontal radiation
    9999.0,      // extraterrestrial direct normal radiation
    9999.0,      // horizontal infrared radiation
    9999.0,      // global horizontal radiation
    9999.0,      // direct normal radiation
    9999.0,      // diffuse horizontal radiation
    999999.0,    // global horizontal illuminance
    999999.0,    // direct normal illuminance
    999999.0,    // diffuse horizontal illuminance
    9999.0,      // zenith luminance
    999.0,       // wind direction
    999.0,       // wind speed
    99.0,        // total sky cover
    99.0,        // opaque sky cover
    9999.0,      // visibility
    99999.0,     // ceiling height
    9.0,         // present weather observation
    999999999.0, // present weather codes
    999.0,       // precipitable water
    0.999,       // aerosol optical depth
    999.0,       // snow depth
    99.0,        // days since last snowfall
    999.0,       // albedo
    999.0,       // liquid precipitation depth
    99.0,        // liquid precipitation quantity
];

/// A single hourly weather record with all 35 EPW columns.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyWeatherRecord {
    pub year: i32,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
    /// Hour (1-24), hour ending.
    pub hour: u8,
    pub minute: u8,
    /// Data source and uncertainty flags, carried opaquely.
    pub data_source: String,
    pub(crate) values: Vec<Cell>,
    /// Source text of the year, month, day, hour and minute columns.
    pub(crate) date_text: [Option<String>; 5],
}

impl HourlyWeatherRecord {
    /// Creates a record whose weather values are the EPW missing codes.
    pub fn with_missing_values(year: i32, month: u8, day: u8, hour: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute: 0,
            data_source: "?9?9?9?9E0?9?9?9?9?9?9?9?9?9?9?9?9?9?9?9*9*9?9?9?9".to_string(),
            values: MISSING_CODES.iter().map(|&v| Cell::synthesized(v)).collect(),
            date_text: Default::default(),
        }
    }

    pub(crate) fn from_parts(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        data_source: String,
        values: Vec<Cell>,
        date_text: [Option<String>; 5],
    ) -> Self {
        debug_assert_eq!(values.len(), NUM_VALUE_FIELDS);
        Self {
            year,
            month,
            day,
            hour,
            minute,
            data_source,
            values,
            date_text,
        }
    }

    /// Year, month, day, hour and minute as written to a file.
    ///
    /// A column keeps its source text (e.g. zero padding) while the text
    /// still denotes the current number.
    pub(crate) fn date_columns(&self) -> [String; 5] {
        let numbers = [
            i64::from(self.year),
            i64::from(self.month),
            i64::from(self.day),
            i64::from(self.hour),
            i64::from(self.minute),
        ];
        std::array::from_fn(|i| match &self.date_text[i] {
            Some(text) if text.trim().parse::<i64>().ok() == Some(numbers[i]) => text.clone(),
            _ => numbers[i].to_string(),
        })
    }

    /// Numeric value of a column; `None` for the data source flags.
    pub fn get(&self, field: WeatherField) -> Option<f64> {
        match field {
            WeatherField::Year => Some(self.year as f64),
            WeatherField::Month => Some(self.month as f64),
            WeatherField::Day => Some(self.day as f64),
            WeatherField::Hour => Some(self.hour as f64),
            WeatherField::Minute => Some(self.minute as f64),
            WeatherField::DataSource => None,
            other => other.value_index().map(|i| self.values[i].value()),
        }
    }

    /// Overwrites a numeric weather value. Returns `false` for date/time and
    /// data source columns, which are not values.
    pub fn set(&mut self, field: WeatherField, value: f64) -> bool {
        match field.value_index() {
            Some(i) => {
                self.values[i].set(value);
                true
            }
            None => false,
        }
    }

    pub fn dry_bulb_temperature(&self) -> f64 {
        self.values[0].value()
    }

    pub fn relative_humidity(&self) -> f64 {
        self.values[2].value()
    }

    /// Moves the record onto the month and day of another record.
    pub fn set_day_from(&mut self, other: &HourlyWeatherRecord) {
        self.month = other.month;
        self.day = other.day;
        self.date_text[1].clone_from(&other.date_text[1]);
        self.date_text[2].clone_from(&other.date_text[2]);
    }

    pub fn same_day(&self, other: &HourlyWeatherRecord) -> bool {
        self.month == other.month && self.day == other.day
    }

    /// Calendar position of this record. EPW hour 24 maps onto hour 0 of the next day.
    pub fn timestamp(&self) -> Option<Timestamp> {
        Timestamp::new(self.month, self.day, self.hour)
    }
}

/// Ordered hourly weather observations for one year, with the file header.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSeries {
    /// Location name.
    pub location: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Time zone (hours from UTC).
    pub timezone: f64,
    /// Elevation in meters.
    pub elevation: f64,
    /// Header lines written back verbatim.
    pub(crate) header: Vec<String>,
    /// 8760 hourly records (or 8784 for leap years).
    pub records: Vec<HourlyWeatherRecord>,
}

impl WeatherSeries {
    pub(crate) fn from_parts(
        location: String,
        latitude: f64,
        longitude: f64,
        timezone: f64,
        elevation: f64,
        header: Vec<String>,
        records: Vec<HourlyWeatherRecord>,
    ) -> Self {
        Self {
            location,
            latitude,
            longitude,
            timezone,
            elevation,
            header,
            records,
        }
    }

    /// Creates simple synthetic weather data for testing.
    ///
    /// Generates 8760 hours with sinusoidal temperature variation and a
    /// constant relative humidity. Fields the model does not cover carry EPW
    /// missing codes.
    pub fn synthetic(location: &str, mean_temp: f64, temp_amplitude: f64, rh: f64) -> Self {
        Self::from_hourly_fn(location, |day_of_year, hour| {
            // Annual variation peaking in July/August, daily peak at 14:00
            let annual_phase = 2.0 * std::f64::consts::PI * (day_of_year as f64 - 200.0) / 365.0;
            let daily_phase = 2.0 * std::f64::consts::PI * (hour as f64 - 14.0) / 24.0;
            let temp = mean_temp + temp_amplitude * annual_phase.cos() + 3.0 * daily_phase.cos();
            (temp, rh)
        })
    }

    /// Creates a year of records from a `(day_of_year, hour) -> (dry bulb, RH)` function.
    ///
    /// `day_of_year` is 1-based, `hour` is the EPW hour (1-24).
    pub fn from_hourly_fn<F>(location: &str, mut f: F) -> Self
    where
        F: FnMut(u16, u8) -> (f64, f64),
    {
        const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        let mut records = Vec::with_capacity(HOURS_PER_YEAR);
        let mut day_of_year = 0u16;
        for (month_idx, &days) in DAYS_IN_MONTH.iter().enumerate() {
            for day in 1..=days {
                day_of_year += 1;
                for hour in 1..=24u8 {
                    let (temp, rh) = f(day_of_year, hour);
                    let mut record =
                        HourlyWeatherRecord::with_missing_values(2023, month_idx as u8 + 1, day, hour);
                    record.set(WeatherField::DryBulbTemperature, temp);
                    record.set(WeatherField::RelativeHumidity, rh);
                    record.set(WeatherField::AtmosphericStationPressure, 101325.0);
                    record.set(WeatherField::WindSpeed, 3.0);
                    record.set(WeatherField::WindDirection, 180.0);
                    record.set(WeatherField::TotalSkyCover, 5.0);
                    record.set(WeatherField::OpaqueSkyCover, 3.0);
                    records.push(record);
                }
            }
        }

        let header = default_header(location);
        Self::from_parts(
            location.to_string(),
            0.0,
            0.0,
            0.0,
            0.0,
            header,
            records,
        )
    }

    /// Returns the number of hours in the dataset.
    pub fn num_hours(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one column, in record order. Data source flags yield NaN.
    pub fn column(&self, field: WeatherField) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.get(field).unwrap_or(f64::NAN))
            .collect()
    }

    pub fn dry_bulb_temperatures(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.dry_bulb_temperature()).collect()
    }

    /// Returns the annual mean temperature.
    pub fn mean_temperature(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.records.iter().map(|r| r.dry_bulb_temperature()).sum();
        sum / self.records.len() as f64
    }

    /// Header lines preceding the data rows.
    pub fn header(&self) -> &[String] {
        &self.header
    }
}

fn default_header(location: &str) -> Vec<String> {
    vec![
        format!("LOCATION,{location},-,-,synthetic,000000,0.0,0.0,0.0,0.0"),
        "DESIGN CONDITIONS,0".to_string(),
        "TYPICAL/EXTREME PERIODS,0".to_string(),
        "GROUND TEMPERATURES,0".to_string(),
        "HOLIDAYS/DAYLIGHT SAVINGS,No,0,0,0".to_string(),
        "COMMENTS 1,synthetic weather".to_string(),
        "COMMENTS 2,".to_string(),
        "DATA PERIODS,1,1,Data,Sunday, 1/ 1,12/31".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_weather() {
        let weather = WeatherSeries::synthetic("Test City", 10.0, 12.0, 60.0);
        assert_eq!(weather.num_hours(), HOURS_PER_YEAR);
        assert_eq!(weather.location, "Test City");

        let mean = weather.mean_temperature();
        assert!(
            (mean - 10.0).abs() < 3.0,
            "Mean temp should be near 10°C, got {mean}"
        );
        assert!((weather.records[100].relative_humidity() - 60.0).abs() < 1e-12);
        assert_eq!(weather.records.last().map(|r| (r.month, r.day, r.hour)), Some((12, 31, 24)));
    }

    #[test]
    fn test_set_clears_original_text_only_on_change() {
        let mut cell = Cell::parsed(21.0, "21.0");
        cell.set(21.0);
        assert_eq!(cell.render(), "21.0");
        cell.set(22.5);
        assert_eq!(cell.render(), "22.5");
    }

    #[test]
    fn test_format_value_drops_noise() {
        assert_eq!(format_value(26.799999999999997), "26.8");
        assert_eq!(format_value(-0.0000001), "0");
        assert_eq!(format_value(101325.0), "101325");
    }

    #[test]
    fn test_set_rejects_non_value_columns() {
        let mut r = HourlyWeatherRecord::with_missing_values(2023, 1, 1, 1);
        assert!(!r.set(WeatherField::Month, 5.0));
        assert!(!r.set(WeatherField::DataSource, 5.0));
        assert!(r.set(WeatherField::WindSpeed, 5.0));
        assert_eq!(r.get(WeatherField::WindSpeed), Some(5.0));
        assert_eq!(r.get(WeatherField::Month), Some(1.0));
        assert_eq!(r.get(WeatherField::DataSource), None);
    }
}
