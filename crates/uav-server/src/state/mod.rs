//! Shared transport state.

pub mod store;

pub use store::{AppState, DecisionRecord};
