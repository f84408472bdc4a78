//! On-disk layout of a study: `<root>/<building>/<scenario>/`.
//!
//! Each scenario directory holds the building description (`in.idf`), the
//! weather file (`weather.epw`) and, once simulated, the engine output
//! (`eplusout.csv`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const BUILDING_FILE: &str = "in.idf";
pub const WEATHER_FILE: &str = "weather.epw";
pub const OUTPUT_FILE: &str = "eplusout.csv";

/// One (building, weather scenario) unit of work.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScenarioUnit {
    pub building: String,
    pub scenario: String,
    pub dir: PathBuf,
}

impl ScenarioUnit {
    pub fn new(building: &str, scenario: &str, dir: impl Into<PathBuf>) -> Self {
        Self {
            building: building.to_string(),
            scenario: scenario.to_string(),
            dir: dir.into(),
        }
    }

    pub fn building_path(&self) -> PathBuf {
        self.dir.join(BUILDING_FILE)
    }

    pub fn weather_path(&self) -> PathBuf {
        self.dir.join(WEATHER_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(OUTPUT_FILE)
    }

    pub fn has_output(&self) -> bool {
        self.output_path().is_file()
    }
}

fn subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list directory: {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            out.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    out.sort();
    Ok(out)
}

/// Finds every scenario directory containing a weather file, sorted by
/// building then scenario.
pub fn discover_units(root: &Path) -> Result<Vec<ScenarioUnit>> {
    let mut units = Vec::new();
    for (building, building_dir) in subdirectories(root)? {
        for (scenario, dir) in subdirectories(&building_dir)? {
            let unit = ScenarioUnit::new(&building, &scenario, dir);
            if unit.weather_path().is_file() {
                units.push(unit);
            } else {
                tracing::debug!("Skipping {} without {WEATHER_FILE}", unit.dir.display());
            }
        }
    }
    tracing::info!("Discovered {} scenario units under {}", units.len(), root.display());
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_discover_units() -> Result<()> {
        let root = tempdir()?;
        for (b, s) in [("house", "tmy"), ("house", "heatwave"), ("flat", "tmy")] {
            let dir = root.path().join(b).join(s);
            std::fs::create_dir_all(&dir)?;
            std::fs::write(dir.join(WEATHER_FILE), "")?;
        }
        std::fs::create_dir_all(root.path().join("house").join("notes"))?;

        let units = discover_units(root.path())?;
        let names: Vec<(&str, &str)> = units
            .iter()
            .map(|u| (u.building.as_str(), u.scenario.as_str()))
            .collect();
        assert_eq!(names, vec![("flat", "tmy"), ("house", "heatwave"), ("house", "tmy")]);
        assert!(!units[0].has_output());
        Ok(())
    }
}
