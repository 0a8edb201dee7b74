//! Tidal track lookup
//!
//! The Tidal v2 API returns JSON:API documents: the track resource carries
//! `relationships` pointing into a top-level `included` array. Artist and
//! album names are resolved through the first relationship entry, with a
//! fallback to the denormalized `artistName` attribute and finally to the
//! "Unknown ..." literals. Name resolution never fails the lookup.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use super::{extract_track_id, request_client_token, TokenCache};
use crate::config::Credentials;
use crate::error::{Result, ServiceError};
use crate::models::TrackMetadata;

const TOKEN_URL: &str = "https://auth.tidal.com/v1/oauth2/token";
const API_BASE: &str = "https://openapi.tidal.com/v2";

const SERVICE: &str = "tidal";

/// Tidal catalog client.
pub struct TidalClient {
    http: reqwest::Client,
    credentials: Option<Credentials>,
    token: TokenCache,
    api_base: String,
}

impl TidalClient {
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

    /// Resolve a Tidal track URL (or bare id) to normalized metadata.
    pub async fn resolve(&self, reference: &str) -> Result<TrackMetadata> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ServiceError::Config("TIDAL_CLIENT_ID and TIDAL_CLIENT_SECRET must be set".to_string())
        })?;
        let track_id = extract_track_id(reference)?;
        let token = self.bearer_token(credentials).await?;

        let url = format!(
            "{}/tracks/{}?countryCode=US&include=artists,albums",
            self.api_base, track_id
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .header("Accept", "application/vnd.api+json")
            .send()
            .await
            .map_err(|e| ServiceError::upstream(SERVICE, format!("track request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::InvalidReference(format!(
                "Tidal rejected track id {}: {} {}",
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

        let document: Document = response.json().await.map_err(|e| {
            ServiceError::upstream(SERVICE, format!("malformed track payload: {}", e))
        })?;

        Ok(normalize_track(document, reference))
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
struct Document {
    data: ResourceData,
    #[serde(default)]
    included: Vec<IncludedResource>,
}

#[derive(Debug, Deserialize)]
struct ResourceData {
    #[serde(default)]
    attributes: TrackAttributes,
    #[serde(default)]
    relationships: Relationships,
}

#[derive(Debug, Default, Deserialize)]
struct TrackAttributes {
    title: Option<String>,
    /// ISO-8601 interval, e.g. "PT3M25S".
    duration: Option<String>,
    /// Denormalized artist name, present in some v2 responses.
    #[serde(rename = "artistName")]
    artist_name: Option<String>,
    /// Denormalized album title, same provenance.
    album: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Relationships {
    artists: Option<Relationship>,
    albums: Option<Relationship>,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    #[serde(default)]
    data: Vec<ResourceRef>,
}

#[derive(Debug, Deserialize)]
struct ResourceRef {
    id: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct IncludedResource {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: IncludedAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct IncludedAttributes {
    /// Albums carry `title`.
    title: Option<String>,
    /// Artists carry `name`.
    name: Option<String>,
}

/// Resolve the first entry of a to-many relationship against the `included`
/// array, returning that resource's display name.
fn resolve_relationship_name<'a>(
    relationship: Option<&Relationship>,
    included: &'a [IncludedResource],
) -> Option<&'a str> {
    let first = relationship?.data.first()?;
    let resource = included
        .iter()
        .find(|r| r.kind == first.kind && r.id == first.id)?;
    resource
        .attributes
        .name
        .as_deref()
        .or(resource.attributes.title.as_deref())
}

/// Flatten a Tidal JSON:API track document into the common metadata shape.
fn normalize_track(document: Document, reference: &str) -> TrackMetadata {
    let attributes = &document.data.attributes;
    let relationships = &document.data.relationships;

    let title = attributes
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown Title".to_string());

    let artist = resolve_relationship_name(relationships.artists.as_ref(), &document.included)
        .map(str::to_string)
        .or_else(|| attributes.artist_name.clone())
        .unwrap_or_else(|| "Unknown Artist".to_string());

    let album = resolve_relationship_name(relationships.albums.as_ref(), &document.included)
        .map(str::to_string)
        .or_else(|| attributes.album.clone())
        .unwrap_or_else(|| "Unknown Album".to_string());

    let duration_ms = attributes
        .duration
        .as_deref()
        .map(parse_iso_duration)
        .unwrap_or(0);

    TrackMetadata {
        title,
        artist,
        album,
        duration_ms,
        source_url: reference.to_string(),
        // The v2 document does not expose a usable image link for tracks.
        cover_art_url: None,
    }
}

/// Parse an ISO-8601 duration ("PT1H3M25S") into milliseconds.
///
/// Absent components count as zero; input that does not match at all yields
/// 0 rather than an error.
pub fn parse_iso_duration(value: &str) -> u64 {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("duration pattern is valid")
    });

    let Some(captures) = pattern.captures(value) else {
        return 0;
    };
    let component = |index: usize| -> u64 {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let hours = component(1);
    let minutes = component(2);
    let seconds = component(3);
    // Saturate instead of overflowing: a hostile duration still yields a
    // number, never a panic.
    hours
        .saturating_mul(3600)
        .saturating_add(minutes.saturating_mul(60))
        .saturating_add(seconds)
        .saturating_mul(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_iso_duration() {
        assert_eq!(parse_iso_duration("PT3M25S"), 205_000);
        assert_eq!(parse_iso_duration("PT0S"), 0);
        assert_eq!(parse_iso_duration("PT1H2M3S"), 3_723_000);
        assert_eq!(parse_iso_duration("PT45S"), 45_000);
        assert_eq!(parse_iso_duration("PT4M"), 240_000);
        assert_eq!(parse_iso_duration("not a duration"), 0);
        assert_eq!(parse_iso_duration(""), 0);
    }

    #[test]
    fn test_parse_iso_duration_saturates_on_huge_values() {
        assert_eq!(parse_iso_duration("PT10000000000000000H"), u64::MAX);
        // Components too large for u64 fail to parse and count as zero.
        assert_eq!(parse_iso_duration("PT99999999999999999999999S"), 0);
    }

    fn full_document() -> serde_json::Value {
        json!({
            "data": {
                "id": "77646168",
                "type": "tracks",
                "attributes": {
                    "title": "Get Lucky",
                    "duration": "PT4M8S"
                },
                "relationships": {
                    "artists": {"data": [{"id": "a1", "type": "artists"}]},
                    "albums": {"data": [{"id": "b1", "type": "albums"}]}
                }
            },
            "included": [
                {"id": "a1", "type": "artists", "attributes": {"name": "Daft Punk"}},
                {"id": "b1", "type": "albums", "attributes": {"title": "Random Access Memories"}}
            ]
        })
    }

    #[test]
    fn test_normalize_resolves_relationships() {
        let document: Document = serde_json::from_value(full_document()).unwrap();
        let metadata = normalize_track(document, "https://tidal.com/browse/track/77646168");
        assert_eq!(metadata.title, "Get Lucky");
        assert_eq!(metadata.artist, "Daft Punk");
        assert_eq!(metadata.album, "Random Access Memories");
        assert_eq!(metadata.duration_ms, 248_000);
        assert_eq!(metadata.source_url, "https://tidal.com/browse/track/77646168");
    }

    #[test]
    fn test_normalize_falls_back_to_denormalized_artist() {
        let document: Document = serde_json::from_value(json!({
            "data": {
                "attributes": {
                    "title": "Track",
                    "artistName": "Solo Act",
                    "duration": "PT2M"
                }
            }
        }))
        .unwrap();
        let metadata = normalize_track(document, "ref");
        assert_eq!(metadata.artist, "Solo Act");
        assert_eq!(metadata.album, "Unknown Album");
        assert_eq!(metadata.duration_ms, 120_000);
    }

    #[test]
    fn test_normalize_falls_back_to_denormalized_album() {
        let document: Document = serde_json::from_value(json!({
            "data": {
                "attributes": {
                    "title": "Track",
                    "album": "Denormalized Album",
                    "duration": "PT2M"
                },
                "relationships": {
                    "albums": {"data": [{"id": "gone", "type": "albums"}]}
                }
            },
            "included": []
        }))
        .unwrap();
        let metadata = normalize_track(document, "ref");
        assert_eq!(metadata.album, "Denormalized Album");
    }

    #[test]
    fn test_normalize_unresolvable_relationship_uses_fallbacks() {
        // Relationship points at a resource missing from `included`.
        let document: Document = serde_json::from_value(json!({
            "data": {
                "attributes": {"title": "Track"},
                "relationships": {
                    "artists": {"data": [{"id": "gone", "type": "artists"}]}
                }
            },
            "included": []
        }))
        .unwrap();
        let metadata = normalize_track(document, "ref");
        assert_eq!(metadata.artist, "Unknown Artist");
        assert_eq!(metadata.duration_ms, 0);
    }

    #[test]
    fn test_normalize_empty_document_never_fails() {
        let document: Document = serde_json::from_value(json!({"data": {}})).unwrap();
        let metadata = normalize_track(document, "ref");
        assert_eq!(metadata.title, "Unknown Title");
        assert_eq!(metadata.artist, "Unknown Artist");
        assert_eq!(metadata.album, "Unknown Album");
        assert!(!metadata.title.is_empty() && !metadata.artist.is_empty());
    }
}
