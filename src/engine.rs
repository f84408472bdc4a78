//! External whole-building simulation engine.
//!
//! The analysis only needs the engine's hourly output table. [`SimulationEngine`]
//! hides how it is produced; [`EnergyPlusEngine`] runs the EnergyPlus
//! executable as a subprocess.

use std::path::PathBuf;
use std::process::Command;

use rayon::prelude::*;

use crate::error::AnalysisError;
use crate::io::idf::{Idf, IdfObject};
use crate::io::layout::ScenarioUnit;
use crate::weather::Timestamp;

/// Indoor air velocity reported to the comfort models (m/s).
pub const AIR_VELOCITY: f64 = 0.15;
/// Clothing insulation in the cold season (clo).
pub const WINTER_CLOTHING: f64 = 1.0;
/// Clothing insulation from April 1 to September 30 (clo).
pub const SUMMER_CLOTHING: f64 = 0.5;

/// Clothing insulation at a given time, switching hard on April 1 and October 1.
pub fn clothing_insulation(at: Timestamp) -> f64 {
    // 03/31 and 09/30 are days 90 and 273.
    match at.day_of_year() {
        ..=90 => WINTER_CLOTHING,
        91..=273 => SUMMER_CLOTHING,
        _ => WINTER_CLOTHING,
    }
}

/// Hourly variables the analysis reads from the output table.
pub const OUTPUT_VARIABLES: [&str; 6] = [
    "Zone Mean Air Temperature",
    "Zone Air Relative Humidity",
    "Zone Thermal Comfort Fanger Model PMV",
    "Zone Thermal Comfort Fanger Model PPD",
    "Zone Thermal Comfort Pierce Model Standard Effective Temperature",
    "Zone Thermal Comfort Mean Radiant Temperature",
];

pub const WORK_EFFICIENCY_SCHEDULE: &str = "WORK_EFF_SCH";
pub const CLOTHING_SCHEDULE: &str = "CLOTHING_SCH";
pub const AIR_VELOCITY_SCHEDULE: &str = "AIR_VELO_SCH";

/// Output classes replaced by [`OUTPUT_VARIABLES`] (prefixes, any case).
const REPLACED_OUTPUT_CLASSES: [&str; 3] = ["OUTPUT:TABLE", "OUTPUT:VARIABLE", "OUTPUT:METER"];

// Field positions after the class name.
const RUN_PERIOD_BEGIN_MONTH: usize = 1;
const RUN_PERIOD_BEGIN_DAY: usize = 2;
const RUN_PERIOD_END_MONTH: usize = 4;
const RUN_PERIOD_END_DAY: usize = 5;

const PEOPLE_NAME: usize = 0;
const PEOPLE_ZONE: usize = 1;
const PEOPLE_MRT_CALCULATION: usize = 12;
const PEOPLE_WORK_EFFICIENCY: usize = 14;
const PEOPLE_CLOTHING_METHOD: usize = 15;
const PEOPLE_CLOTHING_SCHEDULE: usize = 17;
const PEOPLE_AIR_VELOCITY: usize = 18;
const PEOPLE_COMFORT_MODEL_1: usize = 19;
const PEOPLE_COMFORT_MODEL_2: usize = 20;

fn constant_schedule(name: &str, value: f64) -> IdfObject {
    let value = format!("{value:.2}");
    IdfObject::new(
        "Schedule:Compact",
        &[name, "Any Number", "Through: 12/31", "For: AllDays", "Until: 24:00", value.as_str()],
    )
}

fn clothing_schedule() -> IdfObject {
    let winter = format!("{WINTER_CLOTHING:.2}");
    let summer = format!("{SUMMER_CLOTHING:.2}");
    let mut fields = vec![CLOTHING_SCHEDULE, "Any Number"];
    let periods = [
        ("Through: 03/31", &winter),
        ("Through: 09/30", &summer),
        ("Through: 12/31", &winter),
    ];
    for (through, clo) in periods {
        fields.extend([through, "For: AllDays", "Until: 24:00", clo.as_str()]);
    }
    IdfObject::new("Schedule:Compact", &fields)
}

/// IDF objects requesting the hourly comfort outputs and defining the
/// schedules the Fanger and Pierce models are evaluated with.
pub fn comfort_objects() -> Vec<IdfObject> {
    let mut objects: Vec<IdfObject> = OUTPUT_VARIABLES
        .iter()
        .map(|&v| IdfObject::new("Output:Variable", &["*", v, "Hourly"]))
        .collect();
    objects.push(constant_schedule(WORK_EFFICIENCY_SCHEDULE, 0.0));
    objects.push(clothing_schedule());
    objects.push(constant_schedule(AIR_VELOCITY_SCHEDULE, AIR_VELOCITY));
    objects
}

/// [`comfort_objects`] as IDF text.
///
/// The `People` objects of the building must reference these schedules, use
/// zone-averaged mean radiant temperature and enable the FANGER and PIERCE models.
/// [`prepare_model`] does all of that.
pub fn comfort_output_idf() -> String {
    comfort_objects().iter().map(IdfObject::render).collect()
}

/// Rewrites a building model for the comfort analysis.
///
/// 1. The first `RunPeriod` is set to cover January 1 to December 31 and
///    any other run period is removed.
/// 2. Existing table, variable and meter outputs are replaced by the hourly
///    [`OUTPUT_VARIABLES`].
/// 3. The comfort schedules are (re)defined and every `People` object is
///    named after its zone and set up for the FANGER and PIERCE models.
pub fn prepare_model(idf: &mut Idf) {
    let mut first = true;
    let removed = idf.remove_where(|o| {
        if !o.is("RunPeriod") {
            return false;
        }
        let later = !first;
        first = false;
        later
    });
    match idf.objects_of_mut("RunPeriod").next() {
        Some(run_period) => {
            run_period.set_field(RUN_PERIOD_BEGIN_MONTH, "1");
            run_period.set_field(RUN_PERIOD_BEGIN_DAY, "1");
            run_period.set_field(RUN_PERIOD_END_MONTH, "12");
            run_period.set_field(RUN_PERIOD_END_DAY, "31");
            if removed > 0 {
                tracing::debug!("Removed {removed} extra run periods");
            }
        }
        None => tracing::warn!("Model has no RunPeriod, the engine will only run design days"),
    }

    let outputs = idf.remove_where(|o| {
        let class = o.class.to_ascii_uppercase();
        REPLACED_OUTPUT_CLASSES.iter().any(|p| class.starts_with(p))
    });
    tracing::debug!("Replaced {outputs} output requests");

    let schedules = [WORK_EFFICIENCY_SCHEDULE, CLOTHING_SCHEDULE, AIR_VELOCITY_SCHEDULE];
    idf.remove_where(|o| {
        o.is("Schedule:Compact")
            && o
                .field(0)
                .is_some_and(|name| schedules.iter().any(|s| name.eq_ignore_ascii_case(s)))
    });
    for object in comfort_objects() {
        idf.push(object);
    }

    let mut people = 0;
    for p in idf.objects_of_mut("People") {
        let zone = p.field(PEOPLE_ZONE).unwrap_or_default().to_string();
        p.set_field(PEOPLE_NAME, &zone);
        p.set_field(PEOPLE_MRT_CALCULATION, "ZoneAveraged");
        p.set_field(PEOPLE_WORK_EFFICIENCY, WORK_EFFICIENCY_SCHEDULE);
        p.set_field(PEOPLE_CLOTHING_METHOD, "ClothingInsulationSchedule");
        p.set_field(PEOPLE_CLOTHING_SCHEDULE, CLOTHING_SCHEDULE);
        p.set_field(PEOPLE_AIR_VELOCITY, AIR_VELOCITY_SCHEDULE);
        p.set_field(PEOPLE_COMFORT_MODEL_1, "FANGER");
        p.set_field(PEOPLE_COMFORT_MODEL_2, "PIERCE");
        people += 1;
    }
    if people == 0 {
        tracing::warn!("Model has no People objects, comfort outputs will be empty");
    }
}

/// Rewrites the building model of a unit in place with [`prepare_model`].
pub fn prepare_unit_model(unit: &ScenarioUnit) -> Result<(), AnalysisError> {
    let path = unit.building_path();
    let mut idf = Idf::read(&path)?;
    prepare_model(&mut idf);
    idf.write(&path)?;
    tracing::info!("Prepared {}", path.display());
    Ok(())
}

/// How an engine produced the output of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineRun {
    /// The engine ran and wrote the output table.
    Simulated(PathBuf),
    /// An existing output table was kept.
    Reused(PathBuf),
}

impl EngineRun {
    pub fn output_path(&self) -> &PathBuf {
        match self {
            EngineRun::Simulated(p) | EngineRun::Reused(p) => p,
        }
    }
}

pub trait SimulationEngine: Sync {
    /// Simulates one building under one weather file and returns the
    /// location of the hourly output table.
    fn simulate(&self, unit: &ScenarioUnit) -> Result<EngineRun, AnalysisError>;
}

/// Runs every unit through the engine in parallel. Results keep the unit order.
pub fn simulate_all<E: SimulationEngine>(
    engine: &E,
    units: &[ScenarioUnit],
) -> Vec<Result<EngineRun, AnalysisError>> {
    units.par_iter().map(|unit| engine.simulate(unit)).collect()
}

/// EnergyPlus command line adapter.
#[derive(Debug, Clone)]
pub struct EnergyPlusEngine {
    pub executable: PathBuf,
    /// Re-simulate units that already have an output table.
    pub rerun_all: bool,
}

impl EnergyPlusEngine {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            rerun_all: false,
        }
    }
}

impl SimulationEngine for EnergyPlusEngine {
    fn simulate(&self, unit: &ScenarioUnit) -> Result<EngineRun, AnalysisError> {
        let output = unit.output_path();
        if output.is_file() && !self.rerun_all {
            tracing::debug!("Keeping existing output {}", output.display());
            return Ok(EngineRun::Reused(output));
        }

        tracing::info!("Simulating {}/{}", unit.building, unit.scenario);
        let result = Command::new(&self.executable)
            .arg("-d")
            .arg(&unit.dir)
            .arg("-w")
            .arg(unit.weather_path())
            .arg("-r")
            .arg(unit.building_path())
            .output()
            .map_err(|e| AnalysisError::io(&self.executable, e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AnalysisError::EngineFailed {
                building: unit.building.clone(),
                scenario: unit.scenario.clone(),
                detail: format!("{}: {}", result.status, stderr.trim()),
            });
        }
        if !output.is_file() {
            return Err(AnalysisError::MissingOutput {
                building: unit.building.clone(),
                scenario: unit.scenario.clone(),
                path: output,
            });
        }
        Ok(EngineRun::Simulated(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_clothing_switches_on_fixed_dates() {
        let clo = |m, d| clothing_insulation(Timestamp::new(m, d, 12).unwrap());
        assert_eq!(clo(3, 31), 1.0);
        assert_eq!(clo(4, 1), 0.5);
        assert_eq!(clo(9, 30), 0.5);
        assert_eq!(clo(10, 1), 1.0);
        assert_eq!(clo(1, 1), 1.0);
        // End of 03/31 is the start of 04/01.
        assert_eq!(clothing_insulation(Timestamp::new(3, 31, 24).unwrap()), 0.5);
    }

    #[test]
    fn test_comfort_output_idf() {
        let idf = comfort_output_idf();
        assert_eq!(idf.matches("Output:Variable,").count(), 6);
        assert!(idf.contains("Zone Thermal Comfort Fanger Model PPD"));
        assert!(idf.contains("WORK_EFF_SCH"));
        assert!(idf.contains("Through: 03/31"));
        assert!(idf.contains("0.15;"));
    }

    const MODEL: &str = "\
Version,23.1;
RunPeriod,
    Annual,                  !- Name
    6,                       !- Begin Month
    1,                       !- Begin Day of Month
    ,                        !- Begin Year
    8,                       !- End Month
    31,                      !- End Day of Month
    ,                        !- End Year
    Sunday;                  !- Day of Week for Start Day
RunPeriod,Second,1,1,,1,31,;
Zone,LIVING;
People,
    Occupants,               !- Name
    LIVING,                  !- Zone or ZoneList or Space or SpaceList Name
    OCC_SCH,                 !- Number of People Schedule Name
    People,                  !- Number of People Calculation Method
    3;                       !- Number of People
Schedule:Compact,CLOTHING_SCH,Any Number,Through: 12/31,For: AllDays,Until: 24:00,2.0;
Output:Variable,*,Site Outdoor Air Drybulb Temperature,Timestep;
Output:Meter,Electricity:Facility,Monthly;
OUTPUT:TABLE:SUMMARYREPORTS,AllSummary;
Output:VariableDictionary,IDF;
";

    #[test]
    fn test_prepare_model() {
        let mut idf = Idf::parse(MODEL, std::path::Path::new("in.idf")).unwrap();
        prepare_model(&mut idf);

        let run_periods: Vec<&IdfObject> = idf.objects_of("RunPeriod").collect();
        assert_eq!(run_periods.len(), 1);
        assert_eq!(run_periods[0].field(0), Some("Annual"));
        assert_eq!(&run_periods[0].fields[1..6], ["1", "1", "", "12", "31"]);
        assert_eq!(run_periods[0].field(7), Some("Sunday"));

        let variables: Vec<&str> = idf
            .objects_of("Output:Variable")
            .filter_map(|o| o.field(1))
            .collect();
        assert_eq!(variables, OUTPUT_VARIABLES);
        assert_eq!(idf.objects_of("Output:Meter").count(), 0);
        assert_eq!(idf.objects_of("Output:Table:SummaryReports").count(), 0);
        assert_eq!(idf.objects_of("Output:VariableDictionary").count(), 0);

        let schedules: Vec<&str> = idf
            .objects_of("Schedule:Compact")
            .filter_map(|o| o.field(0))
            .collect();
        assert_eq!(schedules, [WORK_EFFICIENCY_SCHEDULE, CLOTHING_SCHEDULE, AIR_VELOCITY_SCHEDULE]);
        assert!(!idf.render().contains("2.0;"));

        let people = idf.objects_of("People").next().unwrap();
        assert_eq!(people.fields.len(), 21);
        assert_eq!(people.field(0), Some("LIVING"));
        assert_eq!(people.field(4), Some("3"));
        assert_eq!(people.field(12), Some("ZoneAveraged"));
        assert_eq!(people.field(13), Some(""));
        assert_eq!(people.field(14), Some(WORK_EFFICIENCY_SCHEDULE));
        assert_eq!(people.field(15), Some("ClothingInsulationSchedule"));
        assert_eq!(people.field(17), Some(CLOTHING_SCHEDULE));
        assert_eq!(people.field(18), Some(AIR_VELOCITY_SCHEDULE));
        assert_eq!(people.field(19), Some("FANGER"));
        assert_eq!(people.field(20), Some("PIERCE"));

        // Preparing twice changes nothing.
        let once = idf.clone();
        prepare_model(&mut idf);
        assert_eq!(idf, once);
    }

    #[test]
    fn test_prepare_unit_model_rewrites_in_place() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let unit = ScenarioUnit::new("b", "tmy", dir.path());
        std::fs::write(unit.building_path(), MODEL)?;
        prepare_unit_model(&unit)?;
        let idf = Idf::read(&unit.building_path())?;
        assert_eq!(idf.objects_of("Output:Variable").count(), 6);
        assert_eq!(idf.objects_of("Zone").count(), 1);
        Ok(())
    }

    #[test]
    fn test_existing_output_is_reused() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let unit = ScenarioUnit::new("b", "tmy", dir.path());
        std::fs::write(unit.output_path(), "Date/Time\n")?;
        let engine = EnergyPlusEngine::new("/nonexistent/energyplus");
        assert_eq!(engine.simulate(&unit)?, EngineRun::Reused(unit.output_path()));
        Ok(())
    }

    #[test]
    fn test_missing_executable_is_io_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let unit = ScenarioUnit::new("b", "tmy", dir.path());
        let mut engine = EnergyPlusEngine::new("/nonexistent/energyplus");
        engine.rerun_all = true;
        let err = engine.simulate(&unit).unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_engine_exit_status_is_reported() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let unit = ScenarioUnit::new("b", "hw", dir.path());

        let failing = EnergyPlusEngine::new("false");
        let err = failing.simulate(&unit).unwrap_err();
        assert!(matches!(err, AnalysisError::EngineFailed { ref scenario, .. } if scenario == "hw"));

        // Succeeds without writing output.
        let silent = EnergyPlusEngine::new("true");
        let err = silent.simulate(&unit).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingOutput { .. }));
        Ok(())
    }
}
