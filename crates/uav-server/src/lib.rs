//! Shared library surface for the UAV policy server and its tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod loops;
pub mod state;
