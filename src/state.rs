//! Application state
//!
//! One instance of each upstream client, constructed once at startup and
//! passed into the handlers behind an `Arc`. No module-level singletons.

use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::providers::{SpotifyClient, TidalClient};
use crate::youtube::YoutubeClient;

/// Explicit deadline on every upstream provider call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub spotify: SpotifyClient,
    pub tidal: TidalClient,
    pub youtube: YoutubeClient,
}

impl AppState {
    /// Create the application state, sharing one HTTP client between the
    /// provider clients.
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;

        let spotify = SpotifyClient::new(http.clone(), config.spotify.clone());
        let tidal = TidalClient::new(http, config.tidal.clone());
        let youtube = YoutubeClient::new(config.downloads_dir.clone());

        Ok(Self {
            config,
            spotify,
            tidal,
            youtube,
        })
    }
}
