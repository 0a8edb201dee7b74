//! Track Conversion Service
//!
//! A small backend that turns a Spotify or Tidal track link into a
//! downloadable MP3: provider metadata resolution, YouTube source matching,
//! yt-dlp download and transcode, static serving of the result.

mod config;
mod convert;
mod error;
mod http;
mod models;
mod providers;
mod state;
mod youtube;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::Result;
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "tunefetch";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    tracing::info!("{} v{} starting", APP_NAME, VERSION);

    // Load configuration
    let config = Config::from_env();
    tracing::info!(
        "Configuration loaded: spotify={}, tidal={}, downloads_dir={}",
        config.spotify.is_some(),
        config.tidal.is_some(),
        config.downloads_dir.display()
    );

    // The downloads directory backs both the fetcher and the static mount
    std::fs::create_dir_all(&config.downloads_dir)?;

    // Create application state
    let state = Arc::new(AppState::new(config.clone())?);

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config.socket_addr().parse().unwrap();
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();

    Ok(())
}

/// Initialize logging with tracing
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunefetch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
