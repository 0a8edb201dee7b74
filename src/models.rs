//! Request and response shapes shared across the HTTP surface.
//!
//! Every value here lives for a single request: nothing is persisted and
//! nothing is mutated after construction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Canonical track metadata, normalized from either provider.
///
/// `title` and `artist` are always non-empty; unresolvable fields carry the
/// "Unknown ..." fallback literals instead of failing the lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    /// Primary artist, or several artist names joined with `", "`.
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    /// The provider URL this metadata was resolved from.
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_art_url: Option<String>,
}

/// Best-effort external audio source for a track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedSource {
    pub video_id: String,
    pub video_url: String,
    pub title: String,
    pub duration_secs: u64,
}

/// Encoded artifact on disk, addressed by its sanitized filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
}

/// Terminal response of a full conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub metadata: TrackMetadata,
    pub youtube_url: String,
    pub download_url: String,
    pub filename: String,
}

/// Body of the metadata, download and convert endpoints.
#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub url: String,
}

/// Body of the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Response body of the download endpoint.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub filename: String,
    pub download_url: String,
}

/// Structured JSON error body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_omits_null_cover_art() {
        let metadata = TrackMetadata {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            duration_ms: 0,
            source_url: "https://open.spotify.com/track/x".to_string(),
            cover_art_url: None,
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert!(value.get("cover_art_url").is_none());
    }

    #[test]
    fn test_metadata_keeps_cover_art_when_present() {
        let metadata = TrackMetadata {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            duration_ms: 1000,
            source_url: "https://tidal.com/track/1".to_string(),
            cover_art_url: Some("https://resources.tidal.com/images/x.jpg".to_string()),
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value["cover_art_url"],
            "https://resources.tidal.com/images/x.jpg"
        );
    }
}
