//! HTTP request handlers
//!
//! Implements handlers for all conversion endpoints. Every failure maps to a
//! structured JSON body `{"status": "error", "message": ...}` with a status
//! code derived from the error taxonomy.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::convert::{build_download_url, convert};
use crate::error::ServiceError;
use crate::models::{
    ConversionResult, DownloadResponse, ErrorBody, MatchedSource, SearchRequest, TrackMetadata,
    TrackRequest,
};
use crate::state::AppState;
use crate::youtube::search::video_id_hint;

/// HTTP-facing error wrapper around [`ServiceError`].
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            // Missing credentials: the endpoint is unavailable, not the process.
            ServiceError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::InvalidReference(_) => StatusCode::BAD_REQUEST,
            ServiceError::Upstream { .. } | ServiceError::Download(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!("request failed ({}): {}", status, self.0);
        let body = ErrorBody {
            status: "error".to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
    service: &'static str,
    spotify_connected: bool,
    tidal_connected: bool,
}

/// Health probe. Never fails; the connected flags report whether provider
/// credentials are configured.
/// GET /
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "online",
        service: crate::APP_NAME,
        spotify_connected: state.spotify.is_configured(),
        tidal_connected: state.tidal.is_configured(),
    })
}

/// Spotify metadata endpoint
/// POST /v1/spotify/meta
pub async fn spotify_meta(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrackRequest>,
) -> Result<Json<TrackMetadata>, ApiError> {
    Ok(Json(state.spotify.resolve(&request.url).await?))
}

/// Tidal metadata endpoint
/// POST /v1/tidal/meta
pub async fn tidal_meta(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrackRequest>,
) -> Result<Json<TrackMetadata>, ApiError> {
    Ok(Json(state.tidal.resolve(&request.url).await?))
}

/// Search endpoint
/// POST /v1/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<MatchedSource>, ApiError> {
    Ok(Json(state.youtube.find_match(&request.query).await?))
}

/// Direct download endpoint. No track metadata is known here, so the
/// filename derives from the video id.
/// POST /v1/download
pub async fn download(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let filename_base = video_id_hint(&request.url);
    let stored = state
        .youtube
        .fetch_and_encode(&request.url, &filename_base)
        .await?;
    let download_url = build_download_url(
        &request_base_url(&headers),
        &state.config.root_path,
        &stored.filename,
    );
    Ok(Json(DownloadResponse {
        filename: stored.filename,
        download_url,
    }))
}

/// Full conversion endpoint
/// POST /v1/convert
pub async fn convert_track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> Result<Json<ConversionResult>, ApiError> {
    let base_url = request_base_url(&headers);
    Ok(Json(convert(&state, &base_url, &request.url).await?))
}

/// Reconstruct `scheme://host` of the inbound request. `X-Forwarded-Proto`
/// wins over the default scheme when the service sits behind a proxy.
fn request_base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}
