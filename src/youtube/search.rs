//! Best-effort video search
//!
//! A free-text query goes through yt-dlp's `ytsearch1:` pseudo-URL, which
//! asks for exactly one top result without playlist expansion. The JSON
//! output is either a listing with an `entries` array or a single entry
//! document; the first entry is the canonical match either way.

use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;
use url::Url;

use super::{YoutubeClient, SERVICE, YTDLP_BIN};
use crate::error::{Result, ServiceError};
use crate::models::MatchedSource;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

impl YoutubeClient {
    /// Find the best-effort match for a free-text query.
    pub async fn find_match(&self, query: &str) -> Result<MatchedSource> {
        let target = format!("ytsearch1:{}", query);
        tracing::debug!("searching for {:?}", target);

        let mut command = Command::new(YTDLP_BIN);
        command
            .args([
                "--dump-single-json",
                "--no-playlist",
                "--skip-download",
                "--quiet",
                "--",
                &target,
            ])
            .kill_on_drop(true);

        let output = tokio::time::timeout(SEARCH_TIMEOUT, command.output())
            .await
            .map_err(|_| {
                ServiceError::upstream(
                    SERVICE,
                    format!("search timed out after {}s", SEARCH_TIMEOUT.as_secs()),
                )
            })?
            .map_err(|e| {
                ServiceError::upstream(SERVICE, format!("failed to run {}: {}", YTDLP_BIN, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::upstream(
                SERVICE,
                format!("search exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        parse_search_output(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: String,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    title: String,
    /// yt-dlp reports fractional seconds for some extractors.
    #[serde(default)]
    duration: Option<f64>,
}

impl SearchEntry {
    fn into_matched_source(self) -> MatchedSource {
        let video_url = self
            .webpage_url
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", self.id));
        MatchedSource {
            video_id: self.id,
            video_url,
            title: self.title,
            duration_secs: self.duration.map(|d| d.round() as u64).unwrap_or(0),
        }
    }
}

/// Parse yt-dlp's JSON output into the single canonical match.
pub(crate) fn parse_search_output(raw: &[u8]) -> Result<MatchedSource> {
    let document: serde_json::Value = serde_json::from_slice(raw)
        .map_err(|e| ServiceError::upstream(SERVICE, format!("malformed search output: {}", e)))?;

    let entry = if document.get("entries").is_some_and(|e| e.is_array()) {
        document["entries"]
            .as_array()
            .and_then(|entries| entries.first())
            .cloned()
            .ok_or_else(|| {
                ServiceError::upstream(SERVICE, "search returned no results".to_string())
            })?
    } else {
        document
    };

    let entry: SearchEntry = serde_json::from_value(entry)
        .map_err(|e| ServiceError::upstream(SERVICE, format!("malformed search entry: {}", e)))?;
    Ok(entry.into_matched_source())
}

/// Derive a filename-base hint from a video URL when no track metadata is
/// known: the `v` query parameter, or the last path segment.
pub fn video_id_hint(video_url: &str) -> String {
    if let Ok(parsed) = Url::parse(video_url) {
        if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v") {
            return id.into_owned();
        }
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return segment.to_string();
        }
    }
    "audio".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entries_container_takes_first() {
        let raw = json!({
            "entries": [
                {"id": "abc123", "webpage_url": "https://www.youtube.com/watch?v=abc123",
                 "title": "First Match", "duration": 205.0},
                {"id": "zzz", "title": "Second"}
            ]
        });
        let matched = parse_search_output(raw.to_string().as_bytes()).unwrap();
        assert_eq!(matched.video_id, "abc123");
        assert_eq!(matched.title, "First Match");
        assert_eq!(matched.duration_secs, 205);
    }

    #[test]
    fn test_parse_single_entry_document() {
        let raw = json!({
            "id": "xyz",
            "webpage_url": "https://www.youtube.com/watch?v=xyz",
            "title": "Direct Hit",
            "duration": 187.4
        });
        let matched = parse_search_output(raw.to_string().as_bytes()).unwrap();
        assert_eq!(matched.video_id, "xyz");
        assert_eq!(matched.duration_secs, 187);
    }

    #[test]
    fn test_parse_empty_entries_is_an_error() {
        let raw = json!({"entries": []});
        let result = parse_search_output(raw.to_string().as_bytes());
        assert!(matches!(result, Err(ServiceError::Upstream { .. })));
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(parse_search_output(b"not json").is_err());
    }

    #[test]
    fn test_missing_webpage_url_is_reconstructed() {
        let raw = json!({"entries": [{"id": "abc123", "title": "t"}]});
        let matched = parse_search_output(raw.to_string().as_bytes()).unwrap();
        assert_eq!(matched.video_url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(matched.duration_secs, 0);
    }

    #[test]
    fn test_video_id_hint() {
        assert_eq!(
            video_id_hint("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(video_id_hint("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(video_id_hint("not a url"), "audio");
    }
}
