use crate::error::AnalysisError;
use crate::weather::{WeatherField, WeatherSeries};

/// Shifts every dry-bulb temperature by a constant urban-heat-island offset (K).
///
/// Every other field, including the original text of untouched values,
/// passes through unchanged.
pub fn include_uhi_effect(series: &WeatherSeries, uhi_degrees: f64) -> Result<WeatherSeries, AnalysisError> {
    if !uhi_degrees.is_finite() {
        return Err(AnalysisError::InvalidParameter(format!(
            "urban heat island offset must be finite, got {uhi_degrees}"
        )));
    }
    tracing::info!("Adding {uhi_degrees} K urban heat island offset to {}", series.location);

    let mut out = series.clone();
    for record in out.records.iter_mut() {
        let t = record.dry_bulb_temperature();
        record.set(WeatherField::DryBulbTemperature, t + uhi_degrees);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_dry_bulb_moves() {
        let w = WeatherSeries::synthetic("X", 14.0, 9.0, 65.0);
        for offset in [0.0, 0.5, 3.0] {
            let out = include_uhi_effect(&w, offset).unwrap();
            assert_eq!(out.num_hours(), w.num_hours());
            for (a, b) in out.records.iter().zip(&w.records) {
                assert_eq!(a.dry_bulb_temperature(), b.dry_bulb_temperature() + offset);
                for f in WeatherField::values().filter(|&f| f != WeatherField::DryBulbTemperature) {
                    assert_eq!(a.get(f), b.get(f));
                }
                assert_eq!(a.data_source, b.data_source);
            }
        }
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let w = WeatherSeries::synthetic("X", 14.0, 9.0, 65.0);
        assert_eq!(include_uhi_effect(&w, 0.0).unwrap(), w);
    }

    #[test]
    fn test_nan_offset_is_rejected() {
        let w = WeatherSeries::synthetic("X", 14.0, 9.0, 65.0);
        assert!(include_uhi_effect(&w, f64::NAN).is_err());
    }
}
