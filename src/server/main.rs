//! Attendance API server.
//!
//! Accepts intern check-ins over HTTP, evaluates them against the
//! organization's geofence and serves attendance history.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fencepost::checkin::{IngestSettings, LocationIngest};
use fencepost::config::Config;
use fencepost::geocoding::NominatimGeocoder;
use fencepost::store::Store;

mod routes;
use routes::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Geofenced attendance API server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Database directory (overrides config)
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load config")?;
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(path) = args.db_path {
        config.storage.path = path;
    }

    info!("Fencepost API Server");

    let store = Store::open(&config.storage.path).context("Failed to open attendance store")?;
    info!(
        "Store ready with {} organizations and {} check-ins",
        store.organization_count(),
        store.log_count()
    );

    info!("Using geocoder at {}", config.geocoder.base_url);
    let geocoder = NominatimGeocoder::new(&config.geocoder).context("Failed to build geocoder")?;

    let ingest = LocationIngest::new(
        store.clone(),
        Arc::new(geocoder),
        IngestSettings::from(&config),
    );
    let state = Arc::new(AppState { ingest });

    let app = router(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, flushing store");
    store.flush()?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
