//! Error types for poh-proxy.

use thiserror::Error;

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can stop the proxy from starting or serving.
///
/// Per-request failures never surface here: upstream problems are carried as
/// [`crate::verify::UpstreamError`] values and mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem or socket I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client for the upstream API could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}
