pub mod config;
pub mod downloader;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use config::Config;
use downloader::{
    spawn_update, ArtifactLocator, Dispatcher, EngineSelector, EngineUpdater, EngineUpgrade,
    EngineVersion,
};
use server::{build_app, AppState};

/// Wire the engine, updater and locator together and serve until shutdown
pub async fn run(config: Config) -> Result<()> {
    let selector = {
        let mode = config.engine_mode;
        // Availability probes spawn processes synchronously
        tokio::task::spawn_blocking(move || EngineSelector::new(mode))
            .await
            .context("Engine selection task panicked")?
    };
    let version = Arc::new(EngineVersion::new(selector.version_probe()));
    match version.refresh().await {
        Some(v) => tracing::info!(version = %v, "yt-dlp version"),
        None => tracing::warn!("yt-dlp version unknown"),
    }

    let updater: Arc<dyn EngineUpgrade> = Arc::new(EngineUpdater::new());

    tracing::info!("Updating yt-dlp to the newest version");
    spawn_update(updater.clone(), version.clone());

    let state = AppState {
        defaults: Arc::new(config.defaults.clone()),
        dispatcher: Arc::new(Dispatcher::new(
            Arc::new(selector),
            config.forward_postprocessors,
        )),
        locator: Arc::new(ArtifactLocator::new(config.static_root.clone())),
        updater,
        version,
    };

    let app = build_app(state, &config.allowed_origin)?;

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Serving artifacts from {}", config.static_root.display());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
