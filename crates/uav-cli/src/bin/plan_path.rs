//! Offline planner: scenario in, flight-plan policy JSON out.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use uav_cli::Scenario;
use uav_core::{compute_plan, PlannerConfig};

/// Plan a serving cell per path segment for one UAV
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario JSON (uav_id, waypoints, radio_map, service_profile). Uses the built-in demo when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Write the plan to this file as well as stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Utility cost of one handover
    #[arg(long)]
    handover_penalty: Option<f64>,

    /// SINR floor in dB when the scenario has no service profile
    #[arg(long)]
    min_quality_db: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => {
            tracing::info!("No scenario given, planning the built-in demo");
            Scenario::demo()
        }
    };

    let defaults = PlannerConfig::default();
    let config = PlannerConfig {
        handover_penalty: args.handover_penalty.unwrap_or(defaults.handover_penalty),
        min_quality_db: args.min_quality_db.unwrap_or(defaults.min_quality_db),
        ..defaults
    };

    let plan = compute_plan(
        &scenario.uav_id,
        &scenario.waypoints,
        &scenario.radio_map,
        scenario.service_profile.as_ref(),
        &config,
    )
    .with_context(|| format!("Planning failed for {}", scenario.uav_id))?;

    tracing::info!(
        "Planned {} segments over {} waypoints for {}",
        plan.segments.len(),
        scenario.waypoints.len(),
        plan.uav_id
    );

    let json = serde_json::to_string_pretty(&plan)?;
    println!("{}", json);

    if let Some(out) = &args.out {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(out, &json).with_context(|| format!("Failed to write {}", out.display()))?;
        tracing::info!("Wrote plan for {} to {}", plan.uav_id, out.display());
    }

    Ok(())
}
