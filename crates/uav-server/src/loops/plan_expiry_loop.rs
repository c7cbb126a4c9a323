//! Plan store expiry loop.
//!
//! Lookups already ignore expired plans; this loop reclaims plans for UAVs
//! that stopped reporting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::state::AppState;

const LOOP_INTERVAL_SECS: u64 = 30;

pub async fn run_plan_expiry_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(Duration::from_secs(LOOP_INTERVAL_SECS));

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Plan expiry loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let removed = state.prune_plans();
                if removed > 0 {
                    tracing::debug!(
                        "Pruned {} stored plans ({} remaining)",
                        removed,
                        state.plan_count()
                    );
                }
            }
        }
    }
}
