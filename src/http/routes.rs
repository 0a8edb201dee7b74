//! Axum router configuration

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{convert_track, download, health, search, spotify_meta, tidal_meta};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
        .max_age(Duration::from_secs(3600));

    Router::new()
        // Health probe
        .route("/", get(health))
        // Conversion API
        .route("/v1/spotify/meta", post(spotify_meta))
        .route("/v1/tidal/meta", post(tidal_meta))
        .route("/v1/search", post(search))
        .route("/v1/download", post(download))
        .route("/v1/convert", post(convert_track))
        // Produced audio files, read-only
        .nest_service("/downloads", ServeDir::new(&state.config.downloads_dir))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}
