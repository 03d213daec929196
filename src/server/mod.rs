//! HTTP surface: routes, shared state and middleware.

pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::downloader::{
    ArtifactLocator, Dispatcher, EngineUpgrade, EngineVersion, ExtractionDefaults,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub defaults: Arc<ExtractionDefaults>,
    pub dispatcher: Arc<Dispatcher>,
    pub locator: Arc<ArtifactLocator>,
    pub updater: Arc<dyn EngineUpgrade>,
    pub version: Arc<EngineVersion>,
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("ALLOWED_ORIGIN '{}' is not a valid header value", allowed_origin))?;

    // A list, not an exact value: only a matching `Origin` gets the header back
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET, Method::POST, Method::PUT]);

    Ok(Router::new()
        .route("/", get(routes::redirect_root))
        .route("/youtube-dl", get(routes::status))
        .route("/youtube-dl/q", post(routes::submit))
        .route("/youtube-dl/update", put(routes::trigger_update))
        .route("/youtube-dl/get", get(routes::fetch_artifact))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
