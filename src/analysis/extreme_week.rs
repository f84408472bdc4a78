use crate::weather::{HOURS_PER_WEEK, WeatherSeries};

/// Step between candidate week starts.
const DAY_STEP: usize = 24;

/// Hottest contiguous week of a circular hourly series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HottestWeek {
    /// Index of the first hour of the week in the original (non-doubled) series.
    pub start_index: usize,
    /// Mean dry-bulb temperature over the week in °C.
    pub mean_temperature: f64,
}

/// Hottest week located in a weather file, with its calendar start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HottestWeekStart {
    pub week: HottestWeek,
    pub month: u8,
    pub day: u8,
}

fn window_mean(values: &[f64], start: usize) -> f64 {
    let n = values.len();
    let sum: f64 = (0..HOURS_PER_WEEK).map(|k| values[(start + k) % n]).sum();
    sum / HOURS_PER_WEEK as f64
}

/// Finds the 168-hour window with the highest mean temperature.
///
/// Candidate windows start every 24 hours and may wrap past the last hour
/// back to the first. The full window mean is recomputed at each step. Ties
/// resolve to the earliest start. Returns `None` for an empty series.
pub fn locate_hottest_week(temperatures: &[f64]) -> Option<HottestWeek> {
    if temperatures.is_empty() {
        return None;
    }

    let mut best = HottestWeek {
        start_index: 0,
        mean_temperature: window_mean(temperatures, 0),
    };
    for start in (DAY_STEP..temperatures.len()).step_by(DAY_STEP) {
        let mean = window_mean(temperatures, start);
        if mean > best.mean_temperature {
            best = HottestWeek {
                start_index: start,
                mean_temperature: mean,
            };
        }
    }
    Some(best)
}

/// Locates the hottest week of a weather file and resolves its first day.
pub fn locate_in_weather(weather: &WeatherSeries) -> Option<HottestWeekStart> {
    let week = locate_hottest_week(&weather.dry_bulb_temperatures())?;
    let first = &weather.records[week.start_index % weather.records.len()];
    Some(HottestWeekStart {
        week,
        month: first.month,
        day: first.day,
    })
}

/// Three-week analysis range: the week before the hottest week, the hottest
/// week and the week after, wrapping at the ends of the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    hottest_start: usize,
    series_len: usize,
}

impl AnalysisWindow {
    /// Number of hours covered by the window.
    pub const LEN: usize = 3 * HOURS_PER_WEEK;

    pub fn around(hottest_start: usize, series_len: usize) -> Self {
        Self {
            hottest_start,
            series_len,
        }
    }

    /// First index of the window (start of the preceding week).
    pub fn start(&self) -> usize {
        if self.series_len == 0 {
            return 0;
        }
        let back = HOURS_PER_WEEK % self.series_len;
        (self.hottest_start % self.series_len + self.series_len - back) % self.series_len
    }

    /// Series indices covered by the window, in chronological order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        let start = self.start();
        let n = self.series_len.max(1);
        let len = if self.series_len == 0 { 0 } else { Self::LEN };
        (0..len).map(move |k| (start + k) % n)
    }

    /// Series indices of the hottest week alone.
    pub fn hottest_week_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices().skip(HOURS_PER_WEEK).take(HOURS_PER_WEEK)
    }

    /// Copies the window out of an hourly series aligned with the source series.
    pub fn extract(&self, series: &[f64]) -> Vec<f64> {
        self.indices().map(|i| series[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::HOURS_PER_YEAR;

    #[test]
    fn test_constant_series_returns_first_window() {
        for len in [HOURS_PER_WEEK, 500, HOURS_PER_YEAR] {
            let temps = vec![21.5; len];
            let week = locate_hottest_week(&temps).unwrap();
            assert_eq!(week.start_index, 0);
            assert!((week.mean_temperature - 21.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_series() {
        assert!(locate_hottest_week(&[]).is_none());
    }

    #[test]
    fn test_distinct_hot_week_is_found() {
        let mut temps = vec![15.0; HOURS_PER_YEAR];
        let start = 200 * 24;
        for t in temps.iter_mut().skip(start).take(HOURS_PER_WEEK) {
            *t = 35.0;
        }
        let week = locate_hottest_week(&temps).unwrap();
        assert_eq!(week.start_index, start);
        assert!((week.mean_temperature - 35.0).abs() < 1e-12);
    }

    #[test]
    fn test_hot_week_wrapping_past_year_end() {
        let mut temps = vec![15.0; HOURS_PER_YEAR];
        // Last 3 days of the year plus first 4 days.
        let start = HOURS_PER_YEAR - 3 * 24;
        for k in 0..HOURS_PER_WEEK {
            temps[(start + k) % HOURS_PER_YEAR] = 30.0;
        }
        let week = locate_hottest_week(&temps).unwrap();
        assert_eq!(week.start_index, start);

        let window = AnalysisWindow::around(week.start_index, temps.len());
        let hot: Vec<usize> = window.hottest_week_indices().collect();
        assert_eq!(hot.len(), HOURS_PER_WEEK);
        assert!(hot.iter().all(|&i| temps[i] == 30.0));
        assert_eq!(hot[0], start);
        assert_eq!(hot[HOURS_PER_WEEK - 1], 4 * 24 - 1);
    }

    #[test]
    fn test_tie_resolves_to_earliest_start() {
        let mut temps = vec![10.0; HOURS_PER_YEAR];
        for start in [50 * 24, 150 * 24] {
            for t in temps.iter_mut().skip(start).take(HOURS_PER_WEEK) {
                *t = 28.0;
            }
        }
        let week = locate_hottest_week(&temps).unwrap();
        assert_eq!(week.start_index, 50 * 24);
    }

    #[test]
    fn test_window_starts_one_week_before_and_wraps() {
        let window = AnalysisWindow::around(24, HOURS_PER_YEAR);
        assert_eq!(window.start(), HOURS_PER_YEAR - HOURS_PER_WEEK + 24);
        let idx: Vec<usize> = window.indices().collect();
        assert_eq!(idx.len(), AnalysisWindow::LEN);
        assert_eq!(idx[HOURS_PER_WEEK], 24);
        assert_eq!(*idx.last().unwrap(), 24 + 2 * HOURS_PER_WEEK - 1);
    }

    #[test]
    fn test_locate_in_weather_resolves_calendar_day() {
        let mut weather = WeatherSeries::synthetic("X", 10.0, 0.0, 50.0);
        // 4380 is noon-ish of July 2nd (day 183).
        weather.records[4380].set(crate::weather::WeatherField::DryBulbTemperature, 45.0);
        let located = locate_in_weather(&weather).unwrap();
        let window: Vec<usize> = (0..HOURS_PER_WEEK)
            .map(|k| located.week.start_index + k)
            .collect();
        assert!(window.contains(&4380));
        let first = &weather.records[located.week.start_index];
        assert_eq!((first.month, first.day, first.hour), (located.month, located.day, 1));
    }
}
