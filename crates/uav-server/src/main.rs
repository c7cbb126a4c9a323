//! UAV policy server - E2 indication endpoint for the path-aware decision engine

use anyhow::{bail, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uav_server::api;
use uav_server::config::Config;
use uav_server::loops;
use uav_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("uav_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting UAV policy server...");

    let config = Config::from_env();
    let violations = config.policy.validate();
    if !violations.is_empty() {
        bail!("invalid policy configuration: {}", violations.join("; "));
    }
    let port = config.server_port;
    tracing::info!(
        "Policy: overload > {}, hysteresis > {} dB, quota [{}, {}]",
        config.policy.overloaded_threshold,
        config.policy.hysteresis_db,
        config.policy.min_quota,
        config.policy.max_quota
    );

    let state = Arc::new(AppState::new(config));
    let (shutdown_tx, _) = broadcast::channel(1);

    let expiry = tokio::spawn(loops::plan_expiry_loop::run_plan_expiry_loop(
        state.clone(),
        shutdown_tx.subscribe(),
    ));

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(());
    if let Err(e) = expiry.await {
        tracing::warn!("Plan expiry loop ended abnormally: {}", e);
    }
    tracing::info!("UAV policy server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
