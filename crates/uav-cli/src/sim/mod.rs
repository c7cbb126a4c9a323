//! Synthetic radio environment and replay helpers.

pub mod client;
pub mod radio;
pub mod replay;
pub mod scenarios;

pub use client::PolicyClient;
pub use radio::{demo_path, serving_snapshot, synthetic_radio_map};
pub use replay::{replay_inputs, DecisionSummary, ReplayInput, ReplayRecord};
pub use scenarios::Scenario;
