//! Error types for the ingestion pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
///
/// `Config`, `Container` and `SinkWrite` terminate a run. `Decode` covers a
/// single artifact in document-extraction mode; the decoder records it and
/// moves on without aborting the sequence.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unresolvable run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// One artifact could not be decoded
    #[error("Failed to decode '{name}': {message}")]
    Decode { name: String, message: String },

    /// Corrupt or unreadable record container
    #[error("Corrupt record container '{path}': {message}")]
    Container { path: String, message: String },

    /// A bulk write to the document store failed
    #[error("Bulk write failed: {0}")]
    SinkWrite(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a per-artifact decode error
    pub fn decode(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a container error
    pub fn container(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Container {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(message: impl Into<String>) -> Self {
        Self::SinkWrite(message.into())
    }
}
