use thiserror::Error;

/// Main error type for the conversion service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid track reference: {0}")]
    InvalidReference(String),

    #[error("{service} error: {detail}")]
    Upstream {
        service: &'static str,
        detail: String,
    },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ServiceError {
    /// Shorthand for an upstream failure with the upstream's own error text
    /// preserved for diagnostics.
    pub fn upstream(service: &'static str, detail: impl Into<String>) -> Self {
        ServiceError::Upstream {
            service,
            detail: detail.into(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ServiceError>;
