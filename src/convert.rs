//! Conversion orchestrator
//!
//! Sequences the full pipeline: provider dispatch, metadata resolution,
//! source matching, download/transcode, response assembly. The sequence is
//! strictly linear; the first failure aborts the call and nothing partial is
//! returned.

use crate::error::Result;
use crate::models::ConversionResult;
use crate::providers::Provider;
use crate::state::AppState;

/// Convert a provider track URL into a stored MP3 plus its download URL.
///
/// `base_url` is the inbound request's `scheme://host`, used to build the
/// externally reachable download URL.
pub async fn convert(state: &AppState, base_url: &str, track_url: &str) -> Result<ConversionResult> {
    let provider = Provider::from_url(track_url)?;
    tracing::info!("converting {} track {}", provider.name(), track_url);

    let metadata = match provider {
        Provider::Spotify => state.spotify.resolve(track_url).await?,
        Provider::Tidal => state.tidal.resolve(track_url).await?,
    };

    let query = format!("{} - {} audio", metadata.artist, metadata.title);
    let matched = state.youtube.find_match(&query).await?;
    tracing::info!("matched {:?} -> {}", query, matched.video_url);

    let filename_base = format!("{} - {}", metadata.artist, metadata.title);
    let stored = state
        .youtube
        .fetch_and_encode(&matched.video_url, &filename_base)
        .await?;

    let download_url = build_download_url(base_url, &state.config.root_path, &stored.filename);

    Ok(ConversionResult {
        metadata,
        youtube_url: matched.video_url,
        download_url,
        filename: stored.filename,
    })
}

/// Build the absolute download URL for a stored file.
///
/// The prefix is normalized to a leading slash and no trailing slash; the
/// result never contains a double slash between host, prefix and the
/// downloads mount.
pub fn build_download_url(base_url: &str, prefix: &str, filename: &str) -> String {
    let host = base_url.trim_end_matches('/');
    let prefix = crate::config::normalize_prefix(prefix);
    format!("{}{}/downloads/{}", host, prefix, filename)
}
