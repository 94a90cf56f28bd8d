//! Pipeline error types

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use cairn_core::CoreError;
use cairn_provisioner::ProvisionerError;
use cairn_resolve::ResolveError;

#[derive(Debug, Error, Diagnostic)]
pub enum BundleError {
    #[error(transparent)]
    #[diagnostic(
        code(cairn::bundle::manifest),
        help("Check bundle.yaml: params, connections, artifacts and ui must be schema objects")
    )]
    Core(#[from] CoreError),

    #[error(transparent)]
    #[diagnostic(
        code(cairn::bundle::resolve),
        help("Check the `$ref` values in bundle.yaml and the files they point to")
    )]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(
        code(cairn::bundle::provisioner),
        help("Check the step paths and provisioner names under `steps`")
    )]
    Provisioner(#[from] ProvisionerError),

    #[error("Generated schema {file} is not a valid JSON Schema: {message}")]
    #[diagnostic(code(cairn::bundle::schema_shape))]
    SchemaShape { file: String, message: String },

    #[error("Failed to write {}: {source}", path.display())]
    #[diagnostic(code(cairn::bundle::io))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Confirmation prompt failed: {0}")]
    #[diagnostic(code(cairn::bundle::prompt))]
    Prompt(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BundleError>;
