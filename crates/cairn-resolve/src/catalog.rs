//! Catalog lookup capability
//!
//! A bare-name `$ref` (e.g. `aws-iam-role`) is resolved through a catalog.
//! The resolver only needs the single [`CatalogLookup::lookup`] operation;
//! the catalog API client itself lives elsewhere.

use async_trait::async_trait;
use std::collections::HashMap;

use cairn_core::SchemaNode;

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::http::HttpFetcher;

/// Resolve a named definition to its schema document
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<SchemaNode>;
}

/// Unwrap a catalog document to its nested `schema` object, if it has one
pub fn unwrap_definition(document: SchemaNode) -> SchemaNode {
    match document.get("schema") {
        Some(inner @ SchemaNode::Object(_)) => inner.clone(),
        _ => document,
    }
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    definitions: HashMap<String, SchemaNode>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definition(mut self, name: impl Into<String>, document: SchemaNode) -> Self {
        self.insert(name, document);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, document: SchemaNode) {
        self.definitions.insert(name.into(), document);
    }

    /// Names known to this catalog, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl CatalogLookup for StaticCatalog {
    async fn lookup(&self, name: &str) -> Result<SchemaNode> {
        self.definitions
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::Catalog {
                name: name.to_string(),
                message: "no such definition".to_string(),
            })
    }
}

/// Catalog served over HTTP at `{base_url}/definitions/{name}`
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: String,
    token: Option<String>,
    fetcher: HttpFetcher,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, token: Option<String>, fetcher: HttpFetcher) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            fetcher,
        }
    }

    /// Build from configuration; `None` when no catalog URL is set
    pub fn from_config(config: &ResolverConfig, fetcher: HttpFetcher) -> Option<Self> {
        config
            .catalog_url
            .as_ref()
            .map(|url| Self::new(url.clone(), config.catalog_token.clone(), fetcher))
    }

    pub fn definition_url(&self, name: &str) -> String {
        format!("{}/definitions/{}", self.base_url, name)
    }
}

#[async_trait]
impl CatalogLookup for HttpCatalog {
    async fn lookup(&self, name: &str) -> Result<SchemaNode> {
        let url = self.definition_url(name);
        tracing::debug!(name, url = %url, "looking up catalog definition");
        self.fetcher.fetch_with_token(&url, self.token.as_deref()).await
    }
}

/// Catalog used when none is configured; every lookup fails
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredCatalog;

#[async_trait]
impl CatalogLookup for UnconfiguredCatalog {
    async fn lookup(&self, name: &str) -> Result<SchemaNode> {
        Err(ResolveError::Catalog {
            name: name.to_string(),
            message: "no catalog configured (set catalog_url or CAIRN_CATALOG_URL)".to_string(),
        })
    }
}
