//! Cairn Core - schema model and synchronization primitives
//!
//! This crate provides:
//! - The generic schema IR ([`SchemaNode`])
//! - Bundle manifest types and loading
//! - Schema combination and property-set diffing
//! - The generated deployment metadata schema
//! - Manifest lint checks
//! - A format-preserving manifest document for write-back

pub mod document;
pub mod error;
pub mod lint;
pub mod manifest;
pub mod merge;
pub mod metadata;
pub mod schema;

pub use document::ManifestDocument;
pub use error::{CoreError, Result};
pub use lint::{LintFinding, LintReport, LintSeverity, lint_manifest};
pub use manifest::{BundleManifest, BundleSchemaSet, LoadedBundle, MANIFEST_FILE, SchemaKind, Step};
pub use merge::{CombinedSchema, MissingSet, PropertySet, combine, diff, diff_nodes};
pub use metadata::{METADATA_PROPERTY, metadata_schema};
pub use schema::{SchemaMap, SchemaNode};
