//! HTTP server module
//!
//! Axum router plus the request handlers for the conversion API:
//! - Health probe
//! - Per-provider metadata endpoints
//! - Search, download and convert endpoints
//! - Static serving of the downloads directory
//! - Structured JSON error bodies

pub mod handlers;
pub mod routes;

pub use routes::create_router;
