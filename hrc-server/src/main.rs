//! Hybrid Race Coach Server
//!
//! Replays a telemetry trace and serves hot and cold coaching advisories
//! over a REST API with an SSE stream.

use anyhow::{Context, Result};
use clap::Parser;
use hrc_adapters::{DemoTrace, TracingVoice};
use hrc_server::{api, config::CoachConfig, manager, state};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = CoachConfig::parse();
    config.validate()?;

    info!("Starting Hybrid Race Coach Server");

    if config.gemini_api_key.as_deref().unwrap_or_default().is_empty() {
        warn!("GEMINI_API_KEY is not set; cold advisories will report errors");
    }

    // Create application state
    let state = state::AppState::new(
        Arc::new(config.cloud_model()?),
        Arc::new(TracingVoice::new()),
        config.heuristic_delay(),
        config.persona,
    );

    if config.demo {
        let trace = DemoTrace::new()
            .to_trace()
            .context("Failed to build demo trace")?;
        manager::load_trace(&state, trace).await;
    }

    // Probe the on-device model in background
    tokio::spawn({
        let state = state.clone();
        let model = config.local_model();
        let timeout = config.probe_timeout();
        async move {
            manager::initialize_backends(&state, &model, timeout).await;
        }
    });

    // Build the router
    let app = api::create_router(state);

    // Start server
    info!("Server listening on http://{}", config.bind);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
