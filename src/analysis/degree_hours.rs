use serde::{Deserialize, Serialize};

use crate::weather::HOURS_PER_WEEK;

/// Degree-hours and exceedance-hours of one metric against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegreeExceedanceRecord {
    /// Trapezoidal integral of the excess over the year, rounded to 2 decimals.
    pub annual_degree_hours: f64,
    /// Hours with a positive excess over the year.
    pub annual_exceedance_hours: usize,
    /// Largest summed excess of any 168-hour window, rounded to 2 decimals.
    pub worst_week_degree_hours: f64,
    /// Hours with a positive excess within that window.
    pub worst_week_exceedance_hours: usize,
}

/// Worst rolling week of an excess series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorstWeek {
    pub start_index: usize,
    pub degree_hours: f64,
    pub exceedance_hours: usize,
}

/// `max(0, value - threshold)` for every hour.
pub fn excess_over(values: &[f64], threshold: f64) -> Vec<f64> {
    values.iter().map(|&v| (v - threshold).max(0.0)).collect()
}

/// Trapezoidal rule with unit (hourly) spacing.
///
/// A one-sample series has zero width and integrates to zero.
pub fn trapezoid(values: &[f64]) -> f64 {
    values.windows(2).map(|w| 0.5 * (w[0] + w[1])).sum()
}

/// Finds the 168-hour window with the largest summed excess.
///
/// The window start sweeps hour by hour over every index of the series and
/// wraps past the end. The sum is maintained incrementally: the outgoing hour
/// is subtracted and the incoming hour added. The earliest maximal window wins.
pub fn worst_week(excess: &[f64]) -> WorstWeek {
    let n = excess.len();
    if n == 0 {
        return WorstWeek {
            start_index: 0,
            degree_hours: 0.0,
            exceedance_hours: 0,
        };
    }

    let at = |i: usize| excess[i % n];

    let mut total: f64 = (0..HOURS_PER_WEEK).map(at).sum();
    let mut over: usize = (0..HOURS_PER_WEEK).filter(|&i| at(i) > 0.0).count();

    let mut best = WorstWeek {
        start_index: 0,
        degree_hours: total,
        exceedance_hours: over,
    };

    for start in 1..n {
        let outgoing = at(start - 1);
        let incoming = at(start + HOURS_PER_WEEK - 1);
        total = total - outgoing + incoming;
        over = over + usize::from(incoming > 0.0) - usize::from(outgoing > 0.0);

        if total > best.degree_hours {
            best = WorstWeek {
                start_index: start,
                degree_hours: total,
                exceedance_hours: over,
            };
        }
    }
    best
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Computes annual and worst-week degree/exceedance hours of a series.
pub fn degree_exceedance(values: &[f64], threshold: f64) -> DegreeExceedanceRecord {
    let excess = excess_over(values, threshold);
    let worst = worst_week(&excess);
    DegreeExceedanceRecord {
        annual_degree_hours: round2(trapezoid(&excess)),
        annual_exceedance_hours: excess.iter().filter(|&&e| e > 0.0).count(),
        worst_week_degree_hours: round2(worst.degree_hours),
        worst_week_exceedance_hours: worst.exceedance_hours,
    }
}
