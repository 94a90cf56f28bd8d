//! Cairn Bundle - build and import pipelines
//!
//! - [`run_build`]: manifest -> generated schema files and IaC declarations
//! - [`run_import`]: IaC declarations -> manifest `params`

pub mod build;
pub mod error;
pub mod import;
pub mod prompt;

pub use build::{
    BuildOptions, BuildReport, DEFAULT_ID_BASE, StepExport, combined_schema, resolve_schema_set,
    run_build,
};
pub use error::{BundleError, Result};
pub use import::{ImportOptions, ImportOutcome, discover_missing, run_import};
pub use prompt::{AlwaysConfirm, Confirm, ConsoleConfirm, ScriptedConfirm};
