//! Mixtape server (mixtaped) - Main entry point
//!
//! Loads the persisted user and catalog documents, optionally seeds the
//! catalog from a directory of audio files, and serves the line-delimited
//! JSON protocol over TCP until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mixtape::config::{Args, Config};
use mixtape::dispatch::AppState;
use mixtape::ids::IdAllocator;
use mixtape::persist::Documents;
use mixtape::store::Store;
use mixtape::{seed, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mixtape=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::resolve(args)
        .await
        .context("Failed to resolve configuration")?;

    info!("Starting Mixtape server on {}", config.listen);
    info!("Data directory: {}", config.data_dir.display());
    info!("Music directory: {}", config.music_dir.display());

    let docs = Documents::new(&config.data_dir);
    docs.ensure_dirs()
        .await
        .context("Failed to create data directory")?;
    tokio::fs::create_dir_all(&config.music_dir)
        .await
        .context("Failed to create music directory")?;

    let ids = IdAllocator::open(docs.counters_path()).context("Failed to open id allocator")?;

    if let Some(seed_dir) = &config.seed_dir {
        seed::seed_catalog(&docs, &ids, seed_dir, &config.music_dir)
            .await
            .context("Failed to seed catalog")?;
    }

    let store = Store::open(docs, ids)
        .await
        .context("Failed to load persisted state")?;
    let state = AppState {
        store: Arc::new(store),
        music_dir: config.music_dir.clone(),
    };

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .context("Failed to bind to listen address")?;
    info!("Accepting connections on {}", config.listen);

    server::run(listener, state, config.workers, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
