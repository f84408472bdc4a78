use std::fs;
use std::path::Path;

use heatresilience::analysis::activity::{AgeGroup, LimitKind};
use heatresilience::analysis::comfort::humidex;
use heatresilience::analysis::locate_hottest_week;
use heatresilience::io::limit_curve::limit_curve_file_name;
use heatresilience::io::layout::{OUTPUT_FILE, WEATHER_FILE};
use heatresilience::io::{discover_units, load_limit_curves, read_results, write_results};
use heatresilience::{
    AnalysisConfig, Metric, MetricKey, MemoryStore, ResultKey, ResultStore, StoredValue, UnitOutcome,
    WeatherSeries, include_uhi_effect, run_analysis, write_epw,
};
use tempfile::tempdir;

const SPIKE_HOUR: usize = 4380;

fn spike_year() -> WeatherSeries {
    WeatherSeries::from_hourly_fn("Spike", |day_of_year, hour| {
        let index = (day_of_year as usize - 1) * 24 + hour as usize - 1;
        let t = if index == SPIKE_HOUR { 45.0 } else { 20.0 };
        (t, 50.0)
    })
}

/// Simulation output with one zone following the outdoor temperature.
fn render_output(weather: &WeatherSeries) -> String {
    let vars = [
        "Zone Mean Air Temperature [C](Hourly)",
        "Zone Air Relative Humidity [%](Hourly)",
        "Zone Thermal Comfort Pierce Model Standard Effective Temperature [C](Hourly)",
        "Zone Thermal Comfort Fanger Model PMV [](Hourly)",
        "Zone Thermal Comfort Mean Radiant Temperature [C](Hourly)",
    ];
    let mut out = String::from("Date/Time");
    for v in vars {
        out.push_str(&format!(",LIVING:{v}"));
    }
    out.push('\n');
    for r in &weather.records {
        let t = r.dry_bulb_temperature();
        let rh = r.relative_humidity();
        out.push_str(&format!(
            " {:02}/{:02}  {:02}:00:00,{t},{rh},{},0.5,{t}\n",
            r.month,
            r.day,
            r.hour,
            t + 1.0
        ));
    }
    out
}

fn write_limit_curves(dir: &Path) -> anyhow::Result<()> {
    for kind in LimitKind::ALL {
        let base = match kind {
            LimitKind::Survivability => 50.0,
            LimitKind::Liveability => 40.0,
            LimitKind::LightActivity => 32.0,
        };
        for age_group in AgeGroup::ALL {
            let shift = if age_group == AgeGroup::Elderly { -2.0 } else { 0.0 };
            let mut csv = String::from("rh,Tair\n");
            for i in 1..=200 {
                let rh = i as f64 * 0.5;
                csv.push_str(&format!("{rh},{}\n", base + shift - 0.1 * rh));
            }
            fs::write(dir.join(limit_curve_file_name(kind, age_group)), csv)?;
        }
    }
    Ok(())
}

fn write_unit(root: &Path, building: &str, scenario: &str, weather: &WeatherSeries) -> anyhow::Result<()> {
    let dir = root.join(building).join(scenario);
    fs::create_dir_all(&dir)?;
    write_epw(&dir.join(WEATHER_FILE), weather)?;
    fs::write(dir.join(OUTPUT_FILE), render_output(weather))?;
    Ok(())
}

#[test]
fn test_spike_lands_in_hottest_week() {
    let weather = spike_year();
    let week = locate_hottest_week(&weather.dry_bulb_temperatures()).unwrap();
    assert!(week.start_index <= SPIKE_HOUR && SPIKE_HOUR < week.start_index + 168);
    assert_eq!(week.start_index % 24, 0);

    let e = 6.112 * (17.67 * 45.0_f64 / (45.0 + 243.5)).exp() * 0.5;
    let expected = 45.0 + 5.0 / 9.0 * (e - 10.0);
    assert!((humidex(45.0, 50.0) - expected).abs() < 0.01);
}

#[test]
fn test_full_run_over_scenario_tree() -> anyhow::Result<()> {
    let root = tempdir()?;
    let limits = tempdir()?;
    write_limit_curves(limits.path())?;

    let tmy = spike_year();
    let hot = include_uhi_effect(&tmy, 3.0)?;
    write_unit(root.path(), "house", "tmy", &tmy)?;
    write_unit(root.path(), "house", "uhi", &hot)?;
    // A scenario that has not been simulated yet.
    let pending = root.path().join("house").join("future");
    fs::create_dir_all(&pending)?;
    write_epw(&pending.join(WEATHER_FILE), &tmy)?;

    let units = discover_units(root.path())?;
    assert_eq!(units.len(), 3);
    let curves = load_limit_curves(limits.path())?;
    let mut store = MemoryStore::new();
    let report = run_analysis(&units, &AnalysisConfig::default(), &curves, &mut store)?;

    assert_eq!(report.completed().count(), 2);
    assert_eq!(report.skipped().count(), 1);
    assert_eq!(report.failed().count(), 0);
    for unit in report.completed() {
        assert!(matches!(unit.outcome, UnitOutcome::Completed { zones: 1, .. }));
    }

    let key = |scenario: &str, metric| ResultKey::new("house", "LIVING", scenario, metric);

    let annual = store
        .get(&key("tmy", MetricKey::Annual(Metric::Temperature)))
        .and_then(StoredValue::as_series)
        .unwrap();
    assert_eq!(annual.len(), 8760);
    assert_eq!(annual[SPIKE_HOUR], 45.0);

    // June to August: 92 days.
    let diff = store
        .get(&key("uhi", MetricKey::SummerDifference(Metric::Temperature)))
        .and_then(StoredValue::as_series)
        .unwrap();
    assert_eq!(diff.len(), 92 * 24);
    assert!(diff.iter().all(|d| (d - 3.0).abs() < 1e-9));
    assert!(!store.contains(&key("tmy", MetricKey::SummerDifference(Metric::Temperature))));

    match store.get(&key("tmy", MetricKey::PeakHumidex)) {
        Some(StoredValue::PeakHumidex(peak)) => {
            assert!((peak.humidex - humidex(45.0, 50.0)).abs() < 1e-9);
            assert_eq!(peak.temperature, 45.0);
        }
        other => panic!("unexpected peak entry {other:?}"),
    }

    match store.get(&key("uhi", MetricKey::Activity(AgeGroup::Elderly))) {
        Some(StoredValue::Activity(tally)) => assert_eq!(tally.total(), 7 * 17),
        other => panic!("unexpected activity entry {other:?}"),
    }

    let path = root.path().join("results.json");
    write_results(&path, &store)?;
    let restored = read_results(&path)?;
    assert_eq!(restored.len(), store.len());
    assert_eq!(restored.run_id(), store.run_id());
    Ok(())
}
