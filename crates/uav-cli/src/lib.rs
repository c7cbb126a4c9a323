//! UAV CLI - offline planning and near-RT replay tools.
//!
//! Binaries:
//! - plan_path: run the DP planner on a scenario and emit a flight-plan policy
//! - replay_path: replay a path against a synthetic radio map and log decisions

pub mod sim;

pub use sim::{PolicyClient, Scenario};
