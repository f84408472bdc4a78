use crate::error::AnalysisError;
use crate::weather::{HOURS_PER_YEAR, WeatherField, WeatherSeries};

/// Fields left equal to the future typical year because observed heatwave
/// sources commonly leave them empty or unreliable.
pub const UNRELIABLE_HEATWAVE_FIELDS: [WeatherField; 15] = [
    WeatherField::ExtraterrestrialHorizontalRadiation,
    WeatherField::ExtraterrestrialDirectNormalRadiation,
    WeatherField::GlobalHorizontalIlluminance,
    WeatherField::DirectNormalIlluminance,
    WeatherField::DiffuseHorizontalIlluminance,
    WeatherField::ZenithLuminance,
    WeatherField::Visibility,
    WeatherField::CeilingHeight,
    WeatherField::PresentWeatherObservation,
    WeatherField::PresentWeatherCodes,
    WeatherField::PrecipitableWater,
    WeatherField::AerosolOpticalDepth,
    WeatherField::DaysSinceLastSnowfall,
    WeatherField::Albedo,
    WeatherField::LiquidPrecipitationQuantity,
];

/// Post-composition bound applied to a field.
fn clamp_field(field: WeatherField, value: f64) -> f64 {
    match field {
        WeatherField::RelativeHumidity => value.clamp(0.0, 100.0),
        WeatherField::TotalSkyCover | WeatherField::OpaqueSkyCover => value.clamp(0.0, 10.0),
        WeatherField::WindDirection => value.rem_euclid(360.0),
        _ => value,
    }
}

/// Composes `future + (heatwave - tmy)` for every weather value field not in
/// `excluded`.
///
/// The output covers the first year (at most 8760 hours) of `future`, whose
/// header and date columns it inherits. Excluded fields keep the future
/// values unchanged.
pub fn create_future_heatwave(
    tmy: &WeatherSeries,
    heatwave: &WeatherSeries,
    future: &WeatherSeries,
    excluded: &[WeatherField],
) -> Result<WeatherSeries, AnalysisError> {
    let n = future.records.len().min(HOURS_PER_YEAR);
    for (name, series) in [("typical year", tmy), ("heatwave year", heatwave)] {
        if series.records.len() < n {
            return Err(AnalysisError::InvalidParameter(format!(
                "{name} has {} hours, future year needs {n}",
                series.records.len()
            )));
        }
    }

    let fields: Vec<WeatherField> = WeatherField::values()
        .filter(|f| !excluded.contains(f))
        .collect();
    tracing::info!(
        "Composing future heatwave over {n} hours, {} adjusted fields",
        fields.len()
    );

    let mut out = future.clone();
    out.records.truncate(n);
    for (i, record) in out.records.iter_mut().enumerate() {
        for &field in &fields {
            let (Some(base), Some(hot), Some(typ)) = (
                record.get(field),
                heatwave.records[i].get(field),
                tmy.records[i].get(field),
            ) else {
                continue;
            };
            record.set(field, clamp_field(field, base + (hot - typ)));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(offset: f64, rh: f64) -> WeatherSeries {
        WeatherSeries::synthetic("X", 12.0 + offset, 8.0, rh)
    }

    #[test]
    fn test_zero_difference_returns_future() {
        let tmy = year(0.0, 60.0);
        let future = year(2.0, 55.0);
        let out = create_future_heatwave(&tmy, &tmy, &future, &UNRELIABLE_HEATWAVE_FIELDS).unwrap();
        assert_eq!(out.num_hours(), HOURS_PER_YEAR);
        for (a, b) in out.records.iter().zip(&future.records) {
            for f in WeatherField::values() {
                assert_eq!(a.get(f), b.get(f), "{}", f.name());
            }
        }
    }

    #[test]
    fn test_difference_is_added_and_clamped() {
        let tmy = year(0.0, 50.0);
        let mut hot = year(4.0, 80.0);
        hot.records[10].set(WeatherField::WindDirection, 350.0);
        hot.records[10].set(WeatherField::TotalSkyCover, 12.0);
        let future = year(1.0, 80.0);

        let out = create_future_heatwave(&tmy, &hot, &future, &UNRELIABLE_HEATWAVE_FIELDS).unwrap();
        let r = &out.records[10];
        let expected = future.records[10].dry_bulb_temperature() + 4.0;
        assert!((r.dry_bulb_temperature() - expected).abs() < 1e-9);
        // 80 + (80 - 50) clamps to 100.
        assert_eq!(r.relative_humidity(), 100.0);
        // 180 + (350 - 180) = 350, 5 + (12 - 5) clamps to 10.
        assert_eq!(r.get(WeatherField::WindDirection), Some(350.0));
        assert_eq!(r.get(WeatherField::TotalSkyCover), Some(10.0));
        // Date columns come from the future year.
        assert_eq!((r.month, r.day, r.hour), (1, 1, 11));
    }

    #[test]
    fn test_wind_direction_wraps() {
        assert_eq!(clamp_field(WeatherField::WindDirection, 370.0), 10.0);
        assert_eq!(clamp_field(WeatherField::WindDirection, -30.0), 330.0);
        assert_eq!(clamp_field(WeatherField::OpaqueSkyCover, -1.0), 0.0);
        assert_eq!(clamp_field(WeatherField::DryBulbTemperature, -40.0), -40.0);
    }

    #[test]
    fn test_excluded_fields_keep_future_values() {
        let tmy = year(0.0, 50.0);
        let mut hot = year(0.0, 50.0);
        for r in hot.records.iter_mut() {
            r.set(WeatherField::Visibility, 0.0);
        }
        let future = year(0.0, 50.0);
        let out = create_future_heatwave(&tmy, &hot, &future, &UNRELIABLE_HEATWAVE_FIELDS).unwrap();
        assert_eq!(
            out.records[0].get(WeatherField::Visibility),
            future.records[0].get(WeatherField::Visibility)
        );
    }

    #[test]
    fn test_short_inputs_are_rejected() {
        let tmy = year(0.0, 50.0);
        let mut hot = year(0.0, 50.0);
        hot.records.truncate(100);
        assert!(create_future_heatwave(&tmy, &hot, &tmy, &UNRELIABLE_HEATWAVE_FIELDS).is_err());
    }
}
