//! Cairn Resolve - `$ref` resolution for bundle schemas
//!
//! Resolves references inside a schema tree from three sources:
//! - Relative files (`./x.json`, `../shared/y.yaml`)
//! - HTTP(S) URLs
//! - Named catalog definitions, through the [`CatalogLookup`] capability
//!
//! Fragment references (`#/...`) are never resolved.

pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod reference;
pub mod resolver;

pub use catalog::{CatalogLookup, HttpCatalog, StaticCatalog, UnconfiguredCatalog, unwrap_definition};
pub use config::ResolverConfig;
pub use error::{ResolveError, Result};
pub use http::HttpFetcher;
pub use reference::Reference;
pub use resolver::{ResolveContext, resolve};
