//! Error taxonomy of the analysis core.
//!
//! Errors carry the identifiers needed to act on them (building, scenario,
//! zone, limit table). Whether an error aborts a whole run or only one
//! (building, scenario) unit is decided by [`AnalysisError::is_fatal_for_run`].

use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::activity::{AgeGroup, LimitKind};

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Weather and simulation output are not aligned, or a series has the wrong length.
    #[error("input shape error for building '{building}', scenario '{scenario}': {detail}")]
    InputShape {
        building: String,
        scenario: String,
        detail: String,
    },

    /// An expected `<Zone>:<Variable>` column is absent from the simulation output.
    #[error("missing column '{zone}:{variable}' in output of building '{building}', scenario '{scenario}'")]
    MissingColumn {
        building: String,
        scenario: String,
        zone: String,
        variable: String,
    },

    /// The external engine has not produced an output table for this unit yet.
    #[error("no simulation output for building '{building}', scenario '{scenario}' at {}", path.display())]
    MissingOutput {
        building: String,
        scenario: String,
        path: PathBuf,
    },

    /// The external engine ran but reported a failure.
    #[error("simulation engine failed for building '{building}', scenario '{scenario}': {detail}")]
    EngineFailed {
        building: String,
        scenario: String,
        detail: String,
    },

    /// A limit-curve table required for classification was never loaded.
    #[error("limit curve {kind:?}/{age_group:?} is not loaded")]
    LimitCurveMissing { kind: LimitKind, age_group: AgeGroup },

    /// A limit-curve table has no entry for a humidity grid point.
    #[error("limit curve {kind:?}/{age_group:?} has no entry at {rh}% relative humidity")]
    LimitCurveGap {
        kind: LimitKind,
        age_group: AgeGroup,
        rh: f64,
    },

    /// A store key was written twice within one run.
    #[error("result key '{0}' was already written in this run")]
    DuplicateKey(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("parse error in {} at line {line}: {detail}", file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        detail: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    /// Reference-data errors invalidate every classification of the run.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::LimitCurveMissing { .. } | Self::LimitCurveGap { .. }
        )
    }

    pub(crate) fn shape(building: &str, scenario: &str, detail: impl Into<String>) -> Self {
        Self::InputShape {
            building: building.to_string(),
            scenario: scenario.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_errors_are_fatal() {
        let gap = AnalysisError::LimitCurveGap {
            kind: LimitKind::Survivability,
            age_group: AgeGroup::Young,
            rh: 42.5,
        };
        assert!(gap.is_fatal_for_run());

        let shape = AnalysisError::shape("b", "tmy", "length mismatch");
        assert!(!shape.is_fatal_for_run());
        assert!(shape.to_string().contains("'b'"));
        assert!(shape.to_string().contains("'tmy'"));
    }
}
