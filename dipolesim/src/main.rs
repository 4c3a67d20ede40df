use dipolesim::{bench_step, EnergyHistory, Error, Scenario, ScenarioConfig};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file under `scenarios/`, or a path to one
    #[arg(short, default_value = "default.yaml")]
    file_name: String,

    /// Override the number of steps in the scenario
    #[arg(long)]
    steps: Option<usize>,

    /// Run the step-throughput benchmark instead of a scenario
    #[arg(long)]
    bench: bool,
}

fn scenario_path(file_name: &str) -> PathBuf {
    let direct = PathBuf::from(file_name);
    if direct.is_file() {
        return direct;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = scenario_path(file_name);
    let scenario_cfg = ScenarioConfig::load(&config_path)
        .with_context(|| format!("failed to load scenario {}", config_path.display()))?;
    Ok(scenario_cfg)
}

fn run(mut scenario: Scenario) -> Result<()> {
    let mut history = EnergyHistory::default();

    for _ in 0..scenario.steps {
        let report = match scenario.system.step(scenario.dt) {
            Ok(report) => report,
            Err(Error::DipoleCollision { separation, contact }) => {
                warn!(
                    separation,
                    contact,
                    t = scenario.system.time(),
                    "dipoles collided, stopping"
                );
                break;
            }
            Err(e) => return Err(e.into()),
        };
        history.push(scenario.system.time(), report.energies);

        if let Some(t) = report.transition {
            info!(t = scenario.system.time(), transition = ?t, "coupling changed");
        }

        let it = scenario.system.iteration() as usize;
        if scenario.report_every > 0 && it % scenario.report_every == 0 {
            let [k0, k1, potential, total] = report.energies;
            info!(
                iteration = it,
                t = scenario.system.time(),
                k0,
                k1,
                potential,
                total,
                state = ?report.state,
                governor = ?report.governor,
                "energies"
            );
        }
    }

    println!("t = {:.6} s after {} steps", scenario.system.time(), scenario.system.iteration());
    for (i, label) in ["dipole 0 kinetic", "dipole 1 kinetic"].iter().enumerate() {
        if let Some(s) = history.stats(i) {
            println!("{label}: mean = {:.6e}, std dev = {:.6e}", s.mean, s.std_dev);
        }
    }
    println!("coupling state: {:?}", scenario.system.state());
    println!("average particle speed: {:.3}", scenario.system.average_speed());

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.bench {
        bench_step()?;
        return Ok(());
    }

    let mut scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    if let Some(steps) = args.steps {
        scenario_cfg.engine.steps = steps;
    }

    let scenario = Scenario::build_scenario(scenario_cfg)?;
    run(scenario)
}
