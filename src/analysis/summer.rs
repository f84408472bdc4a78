//! Summer-month extraction and differences against the baseline scenario.

use crate::error::AnalysisError;
use crate::weather::Timestamp;

/// Hour mask selecting the summer months of a timestamp sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummerMask {
    keep: Vec<bool>,
}

impl SummerMask {
    /// Marks every hour whose (normalized) month is in `months`.
    ///
    /// Months need not be contiguous in calendar order, so a southern
    /// hemisphere summer such as `[12, 1, 2]` works the same way.
    pub fn from_timestamps(timestamps: &[Timestamp], months: &[u8]) -> Self {
        Self {
            keep: timestamps.iter().map(|t| months.contains(&t.month)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keep.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keep.is_empty()
    }

    /// Number of selected hours.
    pub fn selected(&self) -> usize {
        self.keep.iter().filter(|&&k| k).count()
    }

    /// Selected values of a series aligned with the mask.
    pub fn apply(&self, series: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        if series.len() != self.keep.len() {
            return Err(AnalysisError::InvalidParameter(format!(
                "series has {} hours, summer mask has {}",
                series.len(),
                self.keep.len()
            )));
        }
        Ok(series
            .iter()
            .zip(&self.keep)
            .filter_map(|(&v, &k)| k.then_some(v))
            .collect())
    }
}

/// Element-wise `scenario - baseline`.
pub fn difference(scenario: &[f64], baseline: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    if scenario.len() != baseline.len() {
        return Err(AnalysisError::InvalidParameter(format!(
            "scenario series has {} hours, baseline has {}",
            scenario.len(),
            baseline.len()
        )));
    }
    Ok(scenario.iter().zip(baseline).map(|(s, b)| s - b).collect())
}
