//! Spotify track lookup
//!
//! Wraps the client-credentials token exchange and the `/v1/tracks/{id}`
//! endpoint, flattening the track payload into [`TrackMetadata`].

use serde::Deserialize;

use super::{extract_track_id, request_client_token, TokenCache};
use crate::config::Credentials;
use crate::error::{Result, ServiceError};
use crate::models::TrackMetadata;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

const SERVICE: &str = "spotify";

/// Spotify catalog client.
///
/// Constructs successfully without credentials; every `resolve` call then
/// fails with a configuration error so the service can still report partial
/// health.
pub struct SpotifyClient {
    http: reqwest::Client,
    credentials: Option<Credentials>,
    token: TokenCache,
    api_base: String,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            credentials,
            token: TokenCache::default(),
            api_base: API_BASE.to_string(),
        }
    }

    /// Whether credentials are configured. Reported by the health probe.
    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Resolve a Spotify track URL (or bare id) to normalized metadata.
    pub async fn resolve(&self, reference: &str) -> Result<TrackMetadata> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ServiceError::Config(
                "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set".to_string(),
            )
        })?;
        let track_id = extract_track_id(reference)?;
        let token = self.bearer_token(credentials).await?;

        let url = format!("{}/tracks/{}", self.api_base, track_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ServiceError::upstream(SERVICE, format!("track request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::InvalidReference(format!(
                "Spotify rejected track id {}: {} {}",
                track_id, status, body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::upstream(
                SERVICE,
                format!("track endpoint returned {}: {}", status, body),
            ));
        }

        let track: SpotifyTrack = response.json().await.map_err(|e| {
            ServiceError::upstream(SERVICE, format!("malformed track payload: {}", e))
        })?;

        Ok(normalize_track(track, reference))
    }

    async fn bearer_token(&self, credentials: &Credentials) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }
        let fresh = request_client_token(&self.http, TOKEN_URL, credentials, SERVICE).await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    album: SpotifyAlbum,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    name: String,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

/// Flatten a Spotify track payload into the common metadata shape.
///
/// Multiple artists are joined with `", "`; the first (largest) album image
/// becomes the cover art.
fn normalize_track(track: SpotifyTrack, reference: &str) -> TrackMetadata {
    let artist = if track.artists.is_empty() {
        "Unknown Artist".to_string()
    } else {
        track
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let cover_art_url = track.album.images.first().map(|i| i.url.clone());
    let source_url = track
        .external_urls
        .spotify
        .unwrap_or_else(|| reference.to_string());

    let title = if track.name.is_empty() {
        "Unknown Title".to_string()
    } else {
        track.name
    };

    TrackMetadata {
        title,
        artist,
        album: track.album.name,
        duration_ms: track.duration_ms,
        source_url,
        cover_art_url,
    }
}
