//! Limit-curve reference tables.
//!
//! One CSV file per (limit type, age group) with at least the columns `rh`
//! (relative humidity, %) and `Tair` (limiting air temperature, °C). Files
//! are named `<limit>_<age group>.csv`, for example `survivability_elderly.csv`.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::analysis::activity::{AgeGroup, LimitCurve, LimitCurveSet, LimitKind, RH_MAX, RH_MIN};
use crate::error::AnalysisError;

pub fn limit_curve_file_name(kind: LimitKind, age_group: AgeGroup) -> String {
    format!("{}_{}.csv", kind.as_str(), age_group.as_str())
}

/// Parses one limit-curve table.
pub fn parse_limit_curve<R: Read>(
    reader: R,
    source: &Path,
    kind: LimitKind,
    age_group: AgeGroup,
) -> Result<LimitCurve, AnalysisError> {
    let parse_err = |line: usize, detail: String| AnalysisError::Parse {
        file: PathBuf::from(source),
        line,
        detail,
    };

    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(|e| parse_err(1, e.to_string()))?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| parse_err(1, format!("missing column '{name}'")))
    };
    let rh_col = column("rh")?;
    let t_col = column("Tair")?;

    let mut points = Vec::new();
    for (row_idx, row) in rdr.records().enumerate() {
        let line = row_idx + 2;
        let row = row.map_err(|e| parse_err(line, e.to_string()))?;
        let value = |col: usize| -> Result<f64, AnalysisError> {
            let cell = row.get(col).unwrap_or_default().trim();
            cell.parse::<f64>()
                .map_err(|_| parse_err(line, format!("invalid number '{cell}'")))
        };
        let rh = value(rh_col)?;
        if !(RH_MIN..=RH_MAX).contains(&rh) {
            return Err(parse_err(
                line,
                format!("relative humidity {rh} is outside {RH_MIN}..={RH_MAX}"),
            ));
        }
        points.push((rh, value(t_col)?));
    }

    tracing::debug!("Loaded {} limit points from {}", points.len(), source.display());
    LimitCurve::from_points(kind, age_group, points)
}

/// Loads all six limit curves from a directory.
///
/// A missing file is reported as [`AnalysisError::LimitCurveMissing`] and a
/// table not covering every humidity grid point as
/// [`AnalysisError::LimitCurveGap`]. Both abort the run.
pub fn load_limit_curves(dir: &Path) -> Result<LimitCurveSet, AnalysisError> {
    let mut set = LimitCurveSet::new();
    for age_group in AgeGroup::ALL {
        for kind in LimitKind::ALL {
            let path = dir.join(limit_curve_file_name(kind, age_group));
            if !path.is_file() {
                return Err(AnalysisError::LimitCurveMissing { kind, age_group });
            }
            let file = std::fs::File::open(&path).map_err(|e| AnalysisError::io(&path, e))?;
            let curve = parse_limit_curve(file, &path, kind, age_group)?;
            curve.validate_complete()?;
            set.insert(curve);
        }
    }
    tracing::info!("Loaded limit curves from {}", dir.display());
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn table(base: f64) -> String {
        let mut s = String::from("Tair,rh\n");
        for i in 1..=200 {
            let rh = i as f64 * 0.5;
            s.push_str(&format!("{},{}\n", base - 0.1 * rh, rh));
        }
        s
    }

    #[test]
    fn test_parse_columns_by_name() -> Result<()> {
        let csv = "rh,extra,Tair\n40.0,x,38.5\n40.5,y,38.4\n";
        let curve = parse_limit_curve(
            csv.as_bytes(),
            Path::new("t.csv"),
            LimitKind::Liveability,
            AgeGroup::Young,
        )?;
        assert_eq!(curve.len(), 2);
        assert_eq!(curve.limit_at(40.0)?, 38.5);
        assert_eq!(curve.limit_at(40.4)?, 38.4);
        Ok(())
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let err = parse_limit_curve(
            "rh,T\n1,2\n".as_bytes(),
            Path::new("t.csv"),
            LimitKind::Liveability,
            AgeGroup::Young,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_humidity_outside_grid_is_parse_error() {
        let err = parse_limit_curve(
            "rh,Tair\n50.0,38.0\n101.0,37.9\n".as_bytes(),
            Path::new("t.csv"),
            LimitKind::Liveability,
            AgeGroup::Young,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 3, .. }));
    }

    fn write_tables(dir: &Path) -> Result<()> {
        for age_group in AgeGroup::ALL {
            for (kind, base) in [
                (LimitKind::Survivability, 50.0),
                (LimitKind::Liveability, 40.0),
                (LimitKind::LightActivity, 32.0),
            ] {
                std::fs::write(dir.join(limit_curve_file_name(kind, age_group)), table(base))?;
            }
        }
        Ok(())
    }

    #[test]
    fn test_incomplete_table_is_fatal_at_load() -> Result<()> {
        let dir = tempdir()?;
        write_tables(dir.path())?;
        // Drop the 37.5 % row.
        let gappy: String = table(40.0)
            .lines()
            .filter(|l| !l.ends_with(",37.5"))
            .map(|l| format!("{l}\n"))
            .collect();
        std::fs::write(dir.path().join("liveability_young.csv"), gappy)?;
        let err = load_limit_curves(dir.path()).unwrap_err();
        assert!(err.is_fatal_for_run());
        assert!(matches!(err, AnalysisError::LimitCurveGap { rh, .. } if rh == 37.5));
        Ok(())
    }

    #[test]
    fn test_load_directory() -> Result<()> {
        let dir = tempdir()?;
        write_tables(dir.path())?;
        let set = load_limit_curves(dir.path())?;
        set.validate()?;
        let curve = set.get(LimitKind::Survivability, AgeGroup::Elderly)?;
        curve.validate_complete()?;
        assert!((curve.limit_at(50.0)? - 45.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_fatal() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("survivability_young.csv"), table(50.0))?;
        let err = load_limit_curves(dir.path()).unwrap_err();
        assert!(err.is_fatal_for_run());
        assert!(matches!(err, AnalysisError::LimitCurveMissing { kind: LimitKind::Liveability, .. }));
        Ok(())
    }
}
