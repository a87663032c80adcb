mod handlers;

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use crate::{
    config::ServiceConfig,
    simulation::ImpactSimulator,
    upstream::{build_http_client, NasaClient, PlaceResolver, PopulationResolver},
};

pub use handlers::{resolve_feed_range, FeedQuery, FeedResponseBody, MAX_FEED_SPAN_DAYS};

/// Everything a handler needs. Immutable after startup; the inner clients
/// share one connection pool.
#[derive(Clone)]
pub struct AppState {
    pub simulator: ImpactSimulator,
    pub nasa: NasaClient,
}

impl AppState {
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let http = build_http_client().context("Failed to build HTTP client")?;
        Ok(Self {
            simulator: ImpactSimulator::new(
                PopulationResolver::new(http.clone(), config.population.clone()),
                PlaceResolver::new(http.clone(), config.geocoding.clone()),
                config.server.request_timeout(),
            ),
            nasa: NasaClient::new(http, config.nasa.clone()),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/asteroid/simulate-impact", post(handlers::simulate_impact))
        .route("/asteroid/feed", get(handlers::feed))
        .route("/asteroid/get_by_id/:id", get(handlers::get_by_id))
        .with_state(Arc::new(state))
}

pub async fn run(config: ServiceConfig) -> Result<()> {
    if config.nasa.uses_demo_key() {
        tracing::warn!("NASA_API_KEY not set; using DEMO_KEY (rate-limited)");
    }
    let state = AppState::from_config(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "impact service listening (Ctrl+C to stop)");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down impact service");
}
