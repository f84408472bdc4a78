use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

use heatresilience::analysis::extreme_week::locate_in_weather;
use heatresilience::engine::{
    EnergyPlusEngine, EngineRun, comfort_output_idf, prepare_unit_model, simulate_all,
};
use heatresilience::io::{discover_units, load_limit_curves, write_results};
use heatresilience::synth::UNRELIABLE_HEATWAVE_FIELDS;
use heatresilience::{
    AnalysisConfig, HottestDayRule, MemoryStore, RerunPolicy, UnitOutcome, create_future_heatwave,
    extend_heatwave, include_uhi_effect, read_epw, run_analysis, write_epw,
};

#[derive(Parser)]
#[command(name = "heatresilience", version, about = "Heat resilience analysis of building simulations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze simulation outputs under <root>/<building>/<scenario>/
    Analyze {
        #[arg(long)]
        root: PathBuf,
        /// Directory with the limit-curve CSV tables
        #[arg(long)]
        limits: PathBuf,
        /// JSON analysis configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "results.json")]
        output: PathBuf,
        /// Fail units without simulation output instead of skipping them
        #[arg(long)]
        fail_on_missing: bool,
    },
    /// Rewrite every scenario's building model for the comfort analysis
    Prepare {
        #[arg(long)]
        root: PathBuf,
    },
    /// Run the simulation engine for every scenario directory
    Simulate {
        #[arg(long)]
        root: PathBuf,
        #[arg(long, default_value = "energyplus")]
        energyplus: PathBuf,
        /// Re-simulate units that already have output
        #[arg(long)]
        rerun_all: bool,
    },
    /// Print the hottest week of a weather file
    HottestWeek { weather: PathBuf },
    /// Prolong the hottest day of a weather file into a heatwave
    ExtendHeatwave {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        days: usize,
        /// Day to replicate [default: the configured rule]
        #[arg(long, value_enum)]
        rule: Option<HottestDayRule>,
        /// JSON analysis configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Compose future TMY + (heatwave - TMY)
    FutureHeatwave {
        #[arg(long)]
        tmy: PathBuf,
        #[arg(long)]
        heatwave: PathBuf,
        #[arg(long)]
        future: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Shift dry-bulb temperatures by an urban heat island offset
    Uhi {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        degrees: f64,
    },
    /// Print the IDF objects the comfort analysis needs from the engine
    EngineConfig {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            root,
            limits,
            config,
            output,
            fail_on_missing,
        } => {
            let mut config = load_config(config.as_deref())?;
            if fail_on_missing {
                config.rerun_policy = RerunPolicy::FailOnMissing;
            }
            config.log_config();

            let curves = load_limit_curves(&limits)?;
            let units = discover_units(&root)?;
            let mut store = MemoryStore::new();
            tracing::info!("Run {}", store.run_id());
            let report = run_analysis(&units, &config, &curves, &mut store)?;
            write_results(&output, &store)?;

            for unit in &report.units {
                match &unit.outcome {
                    UnitOutcome::Completed { zones, results } => {
                        println!("{}/{}: {zones} zones, {results} results", unit.building, unit.scenario)
                    }
                    UnitOutcome::Skipped { reason } => {
                        println!("{}/{}: skipped ({reason})", unit.building, unit.scenario)
                    }
                    UnitOutcome::Failed(e) => println!("{}/{}: FAILED {e}", unit.building, unit.scenario),
                }
            }
            let failed = report.failed().count();
            if failed > 0 {
                bail!("{failed} of {} units failed", report.units.len());
            }
        }
        Command::Prepare { root } => {
            let units = discover_units(&root)?;
            let mut prepared = 0;
            for unit in &units {
                if unit.building_path().is_file() {
                    prepare_unit_model(unit)?;
                    prepared += 1;
                } else {
                    tracing::warn!("{}/{}: no building model", unit.building, unit.scenario);
                }
            }
            println!("Prepared {prepared} of {} building models", units.len());
        }
        Command::Simulate {
            root,
            energyplus,
            rerun_all,
        } => {
            let units = discover_units(&root)?;
            let engine = EnergyPlusEngine {
                executable: energyplus,
                rerun_all,
            };
            let mut failed = 0;
            for (unit, run) in units.iter().zip(simulate_all(&engine, &units)) {
                match run {
                    Ok(EngineRun::Simulated(_)) => println!("{}/{}: simulated", unit.building, unit.scenario),
                    Ok(EngineRun::Reused(_)) => println!("{}/{}: kept existing output", unit.building, unit.scenario),
                    Err(e) => {
                        failed += 1;
                        println!("{}/{}: FAILED {e}", unit.building, unit.scenario);
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {} simulations failed", units.len());
            }
        }
        Command::HottestWeek { weather } => {
            let series = read_epw(&weather)?;
            let located = locate_in_weather(&series)
                .with_context(|| format!("No data rows in {}", weather.display()))?;
            println!(
                "Hottest week starts {:02}/{:02} (hour index {}), mean {:.2} °C",
                located.month, located.day, located.week.start_index, located.week.mean_temperature
            );
        }
        Command::ExtendHeatwave {
            input,
            output,
            days,
            rule,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let rule = rule.unwrap_or(config.hottest_day_rule);
            tracing::info!("Replicating the hottest day by rule {rule:?}");
            let series = read_epw(&input)?;
            let extended = extend_heatwave(&series, days, rule)?;
            write_epw(&output, &extended)?;
        }
        Command::FutureHeatwave {
            tmy,
            heatwave,
            future,
            output,
        } => {
            let composed = create_future_heatwave(
                &read_epw(&tmy)?,
                &read_epw(&heatwave)?,
                &read_epw(&future)?,
                &UNRELIABLE_HEATWAVE_FIELDS,
            )?;
            write_epw(&output, &composed)?;
        }
        Command::Uhi {
            input,
            output,
            degrees,
        } => {
            let shifted = include_uhi_effect(&read_epw(&input)?, degrees)?;
            write_epw(&output, &shifted)?;
        }
        Command::EngineConfig { output } => {
            let idf = comfort_output_idf();
            match output {
                Some(path) => std::fs::write(&path, idf)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{idf}"),
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_json_file(path),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` selects the level (default `info`). Colors are used when
/// stderr is a terminal.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(env_filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
