//! Scenario replay for CallPilot
//!
//! Runs the scenario through the service against simulated streams and node
//! trees, then prints what the service did.

use anyhow::{Context, Result};
use callpilot_lib::config::Config;
use callpilot_lib::logging;
use callpilot_lib::simulation::{replay, Scenario};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "callpilot",
    about = "Replay a CallPilot scenario against simulated streams",
    version
)]
struct Args {
    /// Scenario file to replay
    scenario: PathBuf,

    /// Config file (defaults to ~/.callpilot/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    logging::init_logging(&config.logging);
    tracing::info!("CallPilot replay starting: {}", args.scenario.display());

    let scenario = Scenario::from_path(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;

    let outcome = replay(&scenario, &config);

    println!(
        "Final status: {} ({})",
        outcome.final_status,
        outcome.final_status.description()
    );
    println!("Events dispatched: {}", outcome.summary.dispatched);
    for change in &outcome.transitions {
        println!("  {} -> {}", change.previous, change.status);
    }
    println!("Hands-free clicks: {}", outcome.clicks);
    for (channel, level) in &outcome.levels {
        println!(
            "  {}: level {} after {} writes",
            channel,
            level,
            outcome.mutations(*channel)
        );
    }

    Ok(())
}
