//! Error types for provisioner codecs

use std::path::PathBuf;
use thiserror::Error;

use cairn_core::CoreError;

#[derive(Debug, Error)]
pub enum ProvisionerError {
    #[error("Step directory not found: {}", path.display())]
    StepNotFound { path: PathBuf },

    #[error("Failed to parse {}: {message}", path.display())]
    Hcl { path: PathBuf, message: String },

    #[error("Failed to parse {}:{line}: {message}", path.display())]
    Bicep {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Provisioner `{name}` cannot read declared variables")]
    UnsupportedBackend { name: String },

    #[error("Cannot render `{property}` for {backend}: {message}")]
    Render {
        backend: String,
        property: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, ProvisionerError>;
