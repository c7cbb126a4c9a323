//! Near-RT mock: replay a planned path and log every decision as JSONL.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use uav_cli::sim::{demo_path, replay_inputs, synthetic_radio_map, DecisionSummary, ReplayRecord};
use uav_cli::{PolicyClient, Scenario};
use uav_core::{compute_plan, decide, FlightPlanPolicy, PlannerConfig, PolicyConfig};

/// Replay a UAV path against the synthetic two-cell radio map
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Flight-plan policy JSON from plan_path. Planned in-process when omitted.
    #[arg(long)]
    plan: Option<PathBuf>,

    /// UAV identifier when no plan file is given
    #[arg(long, default_value = "uav-001")]
    uav_id: String,

    /// Policy server URL. Decisions are made locally when omitted.
    #[arg(long)]
    url: Option<String>,

    /// JSONL output file
    #[arg(long, default_value = "uav-001-demo.jsonl")]
    out: PathBuf,
}

fn load_plan(path: &Path) -> Result<FlightPlanPolicy> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse plan {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let waypoints = demo_path();
    let radio_map = synthetic_radio_map(&waypoints);
    let service = Scenario::hd_video();
    let policy = PolicyConfig::default();

    let plan = match &args.plan {
        Some(path) => load_plan(path)?,
        None => compute_plan(&args.uav_id, &waypoints, &radio_map, Some(&service), &PlannerConfig::default())
            .context("Planning the demo path failed")?,
    };

    let client = match &args.url {
        Some(url) => {
            let client = PolicyClient::new(url.as_str())?;
            if !client.health()? {
                anyhow::bail!("Policy server at {} is not healthy", url);
            }
            client.store_plan(&plan)?;
            tracing::info!("Stored plan for {} at {}", plan.uav_id, url);
            Some(client)
        }
        None => None,
    };

    let inputs = replay_inputs(&plan.uav_id, &waypoints, &radio_map, policy.noise_floor_dbm);
    let started = Utc::now();
    let mut out = BufWriter::new(
        File::create(&args.out).with_context(|| format!("Failed to create {}", args.out.display()))?,
    );

    let mut handovers = 0usize;
    for input in &inputs {
        let decision = match &client {
            Some(client) => client.send_indication(&input.uav, &input.radio, Some(&service))?,
            None => DecisionSummary::from(&decide(
                &input.uav,
                &input.radio,
                Some(&plan),
                Some(&service),
                &policy,
            )?),
        };
        if decision.target_cell_id != input.radio.serving_cell_id {
            handovers += 1;
        }
        tracing::debug!(
            "step {}: serving={} target={} prb={:?}",
            input.step_index,
            input.radio.serving_cell_id,
            decision.target_cell_id,
            decision.prb_quota
        );

        let record = ReplayRecord {
            step_index: input.step_index,
            uav_id: plan.uav_id.clone(),
            decision,
        };
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    let elapsed_ms = (Utc::now() - started).num_milliseconds();
    println!(
        "Wrote {} decisions ({} handovers) for {} to {} in {} ms",
        inputs.len(),
        handovers,
        plan.uav_id,
        args.out.display(),
        elapsed_ms
    );
    Ok(())
}
