use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use expactory::{
    engine::{EngineBuilder, EngineSettings},
    ledger::Resource,
    scenario::{Scenario, ScenarioLoader},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Expactory headless simulation runner")]
struct Cli {
    /// Path to a scenario YAML file (the default island when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override wall-clock seconds per tick
    #[arg(long)]
    tick_seconds: Option<f64>,

    /// Override the time multiplier (1-20)
    #[arg(long)]
    time_scale: Option<f64>,

    /// Let the automation heuristic play
    #[arg(long)]
    auto: bool,

    /// Override snapshot interval in ticks
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .format_timestamp(None)
        .init();

    let scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::default_island(),
    };
    let tick_seconds = cli.tick_seconds.unwrap_or(scenario.tick_seconds);
    if !(tick_seconds.is_finite() && tick_seconds > 0.0) {
        bail!("--tick-seconds must be positive, got {tick_seconds}");
    }

    let mut world = scenario.build_world();
    if let Some(scale) = cli.time_scale {
        world.set_time_scale(scale);
    }
    if cli.auto {
        world.set_automation(true);
    }
    let ticks = scenario.ticks(cli.ticks);

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: cli
            .snapshot_interval
            .unwrap_or(scenario.snapshot_interval_ticks),
        snapshot_dir: cli
            .snapshot_dir
            .unwrap_or_else(|| PathBuf::from("snapshots")),
    };
    let mut engine = EngineBuilder::new(settings).with_default_systems().build();

    log::info!(
        "Running '{}' for {} ticks of {}s at {}x",
        scenario.name,
        ticks,
        tick_seconds,
        world.time_scale()
    );
    engine.run(&mut world, ticks, tick_seconds)?;
    log::info!("Finished at tick {}", world.tick());

    let holdings: Vec<String> = Resource::ALL
        .iter()
        .map(|resource| format!("{resource} {:.1}", world.quantity(*resource)))
        .collect();
    println!(
        "Scenario '{}' completed for {} ticks ({:.1}s simulated, {} days). Holdings: {}",
        scenario.name,
        ticks,
        world.elapsed_sim(),
        world.clock().days_elapsed,
        holdings.join(", ")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_defaults_to_info() {
        let cli = Cli::try_parse_from(["expactory"]).unwrap();
        assert_eq!(cli.log_level, log::LevelFilter::Info);
        let cli = Cli::try_parse_from(["expactory", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, log::LevelFilter::Debug);
    }

    #[test]
    fn misspelled_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["expactory", "--log-level", "verbose"]).is_err());
    }
}
