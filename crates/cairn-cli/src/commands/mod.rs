//! CLI commands

pub mod build;
pub mod import;
pub mod lint;
