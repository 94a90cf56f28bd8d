//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Bundle not found: {path}")]
    BundleNotFound { path: PathBuf },

    #[error("Invalid bundle manifest: {message}")]
    InvalidManifest { message: String },

    #[error("Invalid schema at `{field}`: {message}")]
    SchemaShape { field: String, message: String },

    #[error("Cannot merge into manifest document at `{path}`: {message}")]
    DocumentMerge { path: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub(crate) fn shape(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::SchemaShape {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn merge(path: &[&str], message: impl Into<String>) -> Self {
        CoreError::DocumentMerge {
            path: path.join("."),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
