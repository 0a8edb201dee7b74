//! Service configuration
//!
//! All settings come from the environment. Missing provider credentials are
//! deliberately not a startup error: the owning client reports a
//! configuration error on use instead, so the process can still serve its
//! health probe and the other provider.

use std::path::PathBuf;

/// Client-credential pair for one catalog provider.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Spotify client credentials, if configured
    pub spotify: Option<Credentials>,

    /// Tidal client credentials, if configured
    pub tidal: Option<Credentials>,

    /// Deploy prefix prepended to constructed download URLs.
    /// Normalized: either empty, or leading slash and no trailing slash.
    pub root_path: String,

    /// Directory where encoded audio files are stored and served from
    pub downloads_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            spotify: None,
            tidal: None,
            root_path: String::new(),
            downloads_dir: PathBuf::from("./downloads"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            spotify: credentials_from_env("SPOTIFY_CLIENT_ID", "SPOTIFY_CLIENT_SECRET"),
            tidal: credentials_from_env("TIDAL_CLIENT_ID", "TIDAL_CLIENT_SECRET"),
            root_path: normalize_prefix(&std::env::var("ROOT_PATH").unwrap_or_default()),
            downloads_dir: std::env::var("DOWNLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.downloads_dir),
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn credentials_from_env(id_var: &str, secret_var: &str) -> Option<Credentials> {
    let client_id = std::env::var(id_var).ok().filter(|v| !v.is_empty())?;
    let client_secret = std::env::var(secret_var).ok().filter(|v| !v.is_empty())?;
    Some(Credentials {
        client_id,
        client_secret,
    })
}

/// Normalize a deploy prefix to either the empty string or a path with a
/// leading slash and no trailing slash (`"api/"` -> `"/api"`).
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
