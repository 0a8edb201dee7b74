//! Catalog provider clients
//!
//! One client per provider, each wrapping client-credential OAuth plus a
//! track lookup, normalizing the provider payload into [`TrackMetadata`].
//!
//! [`TrackMetadata`]: crate::models::TrackMetadata

pub mod spotify;
pub mod tidal;

pub use spotify::SpotifyClient;
pub use tidal::TidalClient;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{Result, ServiceError};

/// Closed set of supported catalog providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Spotify,
    Tidal,
}

impl Provider {
    /// Dispatch on the canonical domain fragment of a track URL.
    ///
    /// Unrecognized input is an explicit error; there is no fallback
    /// provider.
    pub fn from_url(url: &str) -> Result<Provider> {
        if url.contains("spotify.com") {
            Ok(Provider::Spotify)
        } else if url.contains("tidal.com") {
            Ok(Provider::Tidal)
        } else {
            Err(ServiceError::InvalidReference(format!(
                "no known provider in URL: {}",
                url
            )))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Spotify => "spotify",
            Provider::Tidal => "tidal",
        }
    }
}

/// Extract the track id from a provider URL or bare reference: the trailing
/// path segment with any query string stripped.
pub fn extract_track_id(reference: &str) -> Result<String> {
    let trimmed = reference.trim().trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or_default();
    let id = segment.split('?').next().unwrap_or_default();
    if id.is_empty() {
        Err(ServiceError::InvalidReference(format!(
            "no track id in reference: {}",
            reference
        )))
    } else {
        Ok(id.to_string())
    }
}

/// Safety margin subtracted from the advertised token lifetime so a token is
/// refreshed before the provider stops accepting it.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// A cached bearer token with its expiry timestamp.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(access_token: String, expires_in_secs: i64) -> Self {
        Self {
            access_token,
            expires_at: Utc::now()
                + Duration::seconds((expires_in_secs - TOKEN_EXPIRY_MARGIN_SECS).max(0)),
        }
    }

    /// Whether the token is still usable.
    pub fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// Bearer token cache shared by concurrent requests.
///
/// The mutex is held across the refresh call so concurrent requests do not
/// issue duplicate token fetches.
pub type TokenCache = Mutex<Option<CachedToken>>;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Perform a client-credentials token exchange against `token_url`.
///
/// A failure here is an upstream error; nothing is cached, so the next call
/// re-attempts a fresh fetch.
pub(crate) async fn request_client_token(
    http: &reqwest::Client,
    token_url: &str,
    credentials: &crate::config::Credentials,
    service: &'static str,
) -> Result<CachedToken> {
    let response = http
        .post(token_url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| ServiceError::upstream(service, format!("token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::upstream(
            service,
            format!("token endpoint returned {}: {}", status, body),
        ));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| ServiceError::upstream(service, format!("malformed token response: {}", e)))?;

    Ok(CachedToken::new(token.access_token, token.expires_in))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_spotify() {
        let provider = Provider::from_url("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(provider.unwrap(), Provider::Spotify);
    }

    #[test]
    fn test_dispatch_tidal() {
        let provider = Provider::from_url("https://tidal.com/browse/track/77646168");
        assert_eq!(provider.unwrap(), Provider::Tidal);
    }

    #[test]
    fn test_dispatch_unrecognized_is_an_error() {
        let result = Provider::from_url("https://example.com/track/123");
        assert!(matches!(result, Err(ServiceError::InvalidReference(_))));
    }

    #[test]
    fn test_dispatch_is_case_sensitive() {
        let result = Provider::from_url("https://TIDAL.COM/track/1");
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_track_id_from_url() {
        let id = extract_track_id("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC").unwrap();
        assert_eq!(id, "4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn test_extract_track_id_strips_query() {
        let id = extract_track_id("https://tidal.com/browse/track/77646168?u=abc").unwrap();
        assert_eq!(id, "77646168");
    }

    #[test]
    fn test_extract_track_id_trailing_slash() {
        let id = extract_track_id("https://tidal.com/browse/track/77646168/").unwrap();
        assert_eq!(id, "77646168");
    }

    #[test]
    fn test_extract_track_id_bare_reference() {
        assert_eq!(extract_track_id("77646168").unwrap(), "77646168");
    }

    #[test]
    fn test_extract_track_id_empty() {
        assert!(extract_track_id("").is_err());
        assert!(extract_track_id("   ").is_err());
    }

    #[test]
    fn test_token_freshness() {
        let fresh = CachedToken::new("tok".to_string(), 3600);
        assert!(fresh.is_fresh());

        // Lifetime shorter than the refresh margin is already stale.
        let stale = CachedToken::new("tok".to_string(), 30);
        assert!(!stale.is_fresh());
    }
}
