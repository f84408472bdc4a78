//! Hourly thermal-comfort indices.
//!
//! Humidex uses the vapour-pressure formulation
//! `e = 6.112 * exp(17.67*T/(T+243.5)) * RH/100`, `H = T + 5/9 * (e - 10)`
//! throughout; the dewpoint-based variant is not used anywhere in the crate.
//! SET and PMV are taken from the simulation engine unchanged.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::key::Metric;

/// Offset between °C and K.
pub const KELVIN: f64 = 273.15;

/// Default indoor air speed in m/s.
pub const DEFAULT_AIR_SPEED: f64 = 0.15;

/// Black globe emissivity and diameter (m) of the standard 150 mm globe.
const GLOBE_EMISSIVITY: f64 = 0.98;
const GLOBE_DIAMETER: f64 = 0.15;

/// Humidex from air temperature (°C) and relative humidity (%).
pub fn humidex(temperature_c: f64, rh: f64) -> f64 {
    let e = 6.112 * (17.67 * temperature_c / (temperature_c + 243.5)).exp() * rh / 100.0;
    temperature_c + (5.0 / 9.0) * (e - 10.0)
}

/// Psychrometric wet-bulb temperature (Stull, 2011).
///
/// Takes and returns Kelvin.
pub fn wet_bulb_temperature(t_k: f64, rh: f64) -> f64 {
    let t = t_k - KELVIN;
    let tw = t * (0.151977 * (rh + 8.313659).sqrt()).atan() + (t + rh).atan()
        - (rh - 1.676331).atan()
        + 0.00391838 * rh.powf(1.5) * (0.023101 * rh).atan()
        - 4.686035;
    tw + KELVIN
}

/// Black globe temperature from air temperature, mean radiant temperature
/// (both Kelvin) and air speed (m/s).
///
/// Solves the globe heat balance `Tg^4 + f*Tg = MRT^4 + f*Ta` with
/// `f = 1.1e8 * va^0.6 / (eps * D^0.4)`. The left side is increasing for
/// positive `Tg`, so Newton iteration from `max(Ta, MRT)` converges
/// monotonically to the single physical root.
pub fn black_globe_temperature(t_k: f64, mrt_k: f64, air_speed: f64) -> f64 {
    let f = 1.1e8 * air_speed.max(0.0).powf(0.6) / (GLOBE_EMISSIVITY * GLOBE_DIAMETER.powf(0.4));
    let rhs = mrt_k.powi(4) + f * t_k;

    let mut tg = t_k.max(mrt_k);
    for _ in 0..100 {
        let g = tg.powi(4) + f * tg - rhs;
        let dg = 4.0 * tg.powi(3) + f;
        let step = g / dg;
        tg -= step;
        if step.abs() < 1e-10 {
            break;
        }
    }
    tg
}

/// Indoor wet-bulb globe temperature (°C): `0.7*WBT + 0.3*BGT`.
pub fn wbgt(temperature_c: f64, rh: f64, mrt_c: f64, air_speed: f64) -> f64 {
    let t_k = temperature_c + KELVIN;
    let wbt = wet_bulb_temperature(t_k, rh) - KELVIN;
    let bgt = black_globe_temperature(t_k, mrt_c + KELVIN, air_speed) - KELVIN;
    0.7 * wbt + 0.3 * bgt
}

/// Raw per-zone series as reported by the simulation engine.
#[derive(Debug, Clone, Default)]
pub struct ZoneRawSeries {
    /// Zone mean air temperature (°C).
    pub temperature: Vec<f64>,
    /// Zone air relative humidity (%).
    pub relative_humidity: Vec<f64>,
    /// Zone mean radiant temperature (°C).
    pub mean_radiant_temperature: Vec<f64>,
    /// Pierce standard effective temperature (°C).
    pub set: Vec<f64>,
    /// Fanger predicted mean vote.
    pub pmv: Vec<f64>,
}

impl ZoneRawSeries {
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    fn check_aligned(&self) -> Result<(), AnalysisError> {
        let n = self.temperature.len();
        let lens = [
            ("relative humidity", self.relative_humidity.len()),
            ("mean radiant temperature", self.mean_radiant_temperature.len()),
            ("SET", self.set.len()),
            ("PMV", self.pmv.len()),
        ];
        for (name, len) in lens {
            if len != n {
                return Err(AnalysisError::InvalidParameter(format!(
                    "{name} series has {len} hours, temperature has {n}"
                )));
            }
        }
        Ok(())
    }
}

/// Hourly comfort indices of one zone, aligned with the raw series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComfortSeries {
    pub temperature: Vec<f64>,
    pub relative_humidity: Vec<f64>,
    pub humidex: Vec<f64>,
    pub set: Vec<f64>,
    pub pmv: Vec<f64>,
    pub wbgt: Vec<f64>,
}

impl ComfortSeries {
    pub fn get(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::RelativeHumidity => &self.relative_humidity,
            Metric::Humidex => &self.humidex,
            Metric::Set => &self.set,
            Metric::Pmv => &self.pmv,
            Metric::Wbgt => &self.wbgt,
        }
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}

/// Highest humidex of a series with the conditions it occurred at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakHumidex {
    pub humidex: f64,
    pub temperature: f64,
    pub relative_humidity: f64,
}

/// Returns the first maximum of the humidex series, `None` when empty.
pub fn peak_humidex(series: &ComfortSeries) -> Option<PeakHumidex> {
    let mut peak: Option<PeakHumidex> = None;
    for (i, &h) in series.humidex.iter().enumerate() {
        if peak.is_none_or(|p| h > p.humidex) {
            peak = Some(PeakHumidex {
                humidex: h,
                temperature: series.temperature[i],
                relative_humidity: series.relative_humidity[i],
            });
        }
    }
    peak
}

/// Derives the five comfort indices from raw zone series.
#[derive(Debug, Clone, Copy)]
pub struct ThermalComfortDeriver {
    /// Indoor air speed assumed for the black globe (m/s).
    pub air_speed: f64,
}

impl ThermalComfortDeriver {
    pub fn new(air_speed: f64) -> Self {
        Self { air_speed }
    }

    /// Computes all indices. Output length and order match the input exactly.
    pub fn derive(&self, raw: &ZoneRawSeries) -> Result<ComfortSeries, AnalysisError> {
        raw.check_aligned()?;

        let humidex_series = raw
            .temperature
            .iter()
            .zip(&raw.relative_humidity)
            .map(|(&t, &rh)| humidex(t, rh))
            .collect();

        let wbgt_series = raw
            .temperature
            .iter()
            .zip(&raw.relative_humidity)
            .zip(&raw.mean_radiant_temperature)
            .map(|((&t, &rh), &mrt)| wbgt(t, rh, mrt, self.air_speed))
            .collect();

        Ok(ComfortSeries {
            temperature: raw.temperature.clone(),
            relative_humidity: raw.relative_humidity.clone(),
            humidex: humidex_series,
            set: raw.set.clone(),
            pmv: raw.pmv.clone(),
            wbgt: wbgt_series,
        })
    }
}

impl Default for ThermalComfortDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_AIR_SPEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humidex_closed_form() {
        let expected = 45.0 + (5.0 / 9.0) * (6.112 * (17.67 * 45.0 / 288.5_f64).exp() * 0.5 - 10.0);
        assert!((humidex(45.0, 50.0) - expected).abs() < 0.01);
        // Environment Canada table: 30°C at 70% RH is about 41.
        assert!((humidex(30.0, 70.0) - 41.0).abs() < 1.0);
    }

    #[test]
    fn test_wet_bulb_stull_reference() {
        // Stull (2011): 20°C, 50% RH -> 13.7°C.
        let tw = wet_bulb_temperature(20.0 + KELVIN, 50.0) - KELVIN;
        assert!((tw - 13.7).abs() < 0.1, "got {tw}");
    }

    #[test]
    fn test_globe_equals_air_when_radiant_equals_air() {
        let t = 30.0 + KELVIN;
        let tg = black_globe_temperature(t, t, 0.15);
        assert!((tg - t).abs() < 1e-8);
    }

    #[test]
    fn test_globe_without_air_movement_equals_mrt() {
        let tg = black_globe_temperature(25.0 + KELVIN, 35.0 + KELVIN, 0.0);
        assert!((tg - (35.0 + KELVIN)).abs() < 1e-8);
    }

    #[test]
    fn test_globe_lies_between_air_and_radiant() {
        let ta = 28.0 + KELVIN;
        let mrt = 40.0 + KELVIN;
        let tg = black_globe_temperature(ta, mrt, 0.15);
        assert!(tg > ta && tg < mrt);
        // More air movement pulls the globe towards air temperature.
        let tg_windy = black_globe_temperature(ta, mrt, 2.0);
        assert!(tg_windy < tg);
    }

    #[test]
    fn test_wbgt_weights() {
        let t = 30.0;
        let rh = 60.0;
        let w = wbgt(t, rh, t, 0.15);
        let wbt = wet_bulb_temperature(t + KELVIN, rh) - KELVIN;
        assert!((w - (0.7 * wbt + 0.3 * t)).abs() < 1e-6);
    }

    fn raw(n: usize) -> ZoneRawSeries {
        ZoneRawSeries {
            temperature: (0..n).map(|i| 20.0 + i as f64).collect(),
            relative_humidity: vec![50.0; n],
            mean_radiant_temperature: (0..n).map(|i| 21.0 + i as f64).collect(),
            set: vec![24.0; n],
            pmv: vec![0.5; n],
        }
    }

    #[test]
    fn test_derive_preserves_length_and_alignment() {
        let raw = raw(48);
        let out = ThermalComfortDeriver::default().derive(&raw).unwrap();
        for metric in Metric::ALL {
            assert_eq!(out.get(metric).len(), 48, "{metric}");
        }
        assert_eq!(out.set, raw.set);
        assert_eq!(out.pmv, raw.pmv);
        assert!((out.humidex[10] - humidex(30.0, 50.0)).abs() < 1e-12);
    }

    #[test]
    fn test_derive_rejects_misaligned_input() {
        let mut raw = raw(24);
        raw.pmv.pop();
        assert!(ThermalComfortDeriver::default().derive(&raw).is_err());
    }

    #[test]
    fn test_peak_humidex_first_maximum() {
        let mut raw = raw(5);
        raw.temperature = vec![25.0, 35.0, 30.0, 35.0, 20.0];
        let out = ThermalComfortDeriver::default().derive(&raw).unwrap();
        let peak = peak_humidex(&out).unwrap();
        assert!((peak.temperature - 35.0).abs() < 1e-12);
        assert!((peak.humidex - out.humidex[1]).abs() < 1e-12);
        assert!(peak_humidex(&ComfortSeries::default()).is_none());
    }
}
