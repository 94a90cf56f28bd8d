//! Error types for reference resolution

use std::path::PathBuf;
use thiserror::Error;

use cairn_core::CoreError;

/// Reference resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    // ============ Lookup Errors ============
    #[error("Referenced file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to fetch {url}: {status}")]
    RemoteFetch { url: String, status: String },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Catalog lookup for `{name}` failed: {message}")]
    Catalog { name: String, message: String },

    // ============ Reference Errors ============
    #[error("Invalid schema at `{reference}`: {message}")]
    SchemaShape { reference: String, message: String },

    #[error(
        "Unsupported reference `{reference}`: expected ./path, ../path, an http(s) URL, a catalog name or a #fragment"
    )]
    UnsupportedReference { reference: String },

    #[error("Circular reference: {chain}")]
    CircularReference { chain: String },

    #[error("Failed to parse {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    // ============ Configuration Errors ============
    #[error("Invalid resolver configuration: {message}")]
    InvalidConfig { message: String },

    // ============ Other ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for reference resolution
pub type Result<T> = std::result::Result<T, ResolveError>;

impl ResolveError {
    pub(crate) fn transport(url: &str, e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            "request timed out".to_string()
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        };
        ResolveError::Transport {
            url: url.to_string(),
            message,
        }
    }
}
