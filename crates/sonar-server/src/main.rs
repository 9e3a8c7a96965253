//! # sonar-server
//!
//! HTTP host for the sonar presentation arbiter.
//!
//! ## Running
//!
//! ```bash
//! # Development
//! cargo run --package sonar-server
//!
//! # Production logging, custom config
//! SONAR_ENV=production SONAR_CONFIG=/etc/sonar/config.toml ./sonar-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::path::PathBuf;

use anyhow::Context;
use sonar_core::{default_config_path, ArbiterConfig};
use sonar_server::api::create_router;
use sonar_server::logging::{self, LogProfile};
use sonar_server::state::AppState;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(LogProfile::from_env())?;

    let config_path =
        std::env::var_os("SONAR_CONFIG").map_or_else(default_config_path, PathBuf::from);
    info!(path = %config_path.display(), "Loading configuration");
    let config = ArbiterConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if !config_path.exists() {
        // Leave an editable file behind for the next start.
        match config.save(&config_path) {
            Ok(()) => info!(path = %config_path.display(), "Wrote default configuration"),
            Err(err) => warn!(error = %err, "Could not write default configuration"),
        }
    }

    let addr = config.bind_address()?;
    let (state, runtime) = AppState::new(config);
    info!(session_id = %state.session_id(), "Starting sonar-server");

    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    runtime.shutdown().await;
    info!("Arbiter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
