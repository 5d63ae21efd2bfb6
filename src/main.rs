//! Proof Gateway service
//!
//! Exposes the verification gateway over HTTP: job registration, proof
//! submission, pending-queue scans, enclave whitelisting, and stats.

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use proof_gateway::{api, config::Config, AppState};

#[derive(Parser)]
#[command(name = "proof-gateway")]
#[command(about = "Verification gateway for outsourced GPU proof jobs")]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("proof_gateway=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let listen_addr = config.server.listen_addr.clone();

    let state = Arc::new(RwLock::new(AppState::from_config(&config)));

    let app = Router::new()
        // Job endpoints
        .route("/jobs", post(api::submit_job))
        .route("/jobs/pending", get(api::pending_jobs))
        .route("/jobs/expire", post(api::expire_jobs))
        .route("/jobs/:id", get(api::get_job))
        .route("/jobs/:id/proof", post(api::submit_proof))
        .route("/jobs/:id/cancel", post(api::cancel_job))
        .route("/verify", post(api::verify_proof))
        // Enclave endpoints
        .route("/enclaves", post(api::whitelist_enclave))
        .route("/enclaves/:measurement", get(api::get_enclave))
        .route("/enclaves/:measurement/revoke", post(api::revoke_enclave))
        // Observability
        .route("/stats", get(api::stats))
        .route("/events", get(api::events))
        .route("/health", get(|| async { "OK" }))
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("gateway listening on {}", listen_addr);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
