//! # lunexis-geo-server
//!
//! HTTP server for the Lunexis geolocation unit.
//!
//! This binary provides:
//! - REST API for positions, geofences and geocoding
//! - A Server-Sent Events stream of location updates
//! - Structured logging to file and stdout
//!
//! ## Running
//!
//! ```bash
//! # Development, against a local gpsd
//! cargo run --package lunexis-geo-server
//!
//! # Development without GPS hardware
//! LUNEXIS_GEO__PROVIDER__KIND=mock cargo run --package lunexis-geo-server --features mock-location
//!
//! # Production
//! LUNEXIS_GEO_ENV=production ./lunexis-geo-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::sync::Arc;

use lunexis_geo_core::GeoConfig;
use lunexis_geo_server::{api, logging, startup};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(logging::is_production())?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting lunexis-geo-server");

    let config = GeoConfig::load()?;
    let addr = config.server.socket_addr()?;

    let state = startup::build_state(config).await?;
    let service = Arc::clone(&state.service);
    let app = api::create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.stop().await;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
