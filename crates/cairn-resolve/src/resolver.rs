//! Recursive `$ref` resolution
//!
//! [`resolve`] walks a schema tree and replaces every object carrying a
//! `$ref` with the referenced document merged under the object's own
//! sibling keys. Sibling keys always win over keys of the referenced
//! document. Fragment references (`#/...`) are kept as written while their
//! sibling keys are still resolved.
//!
//! Relative file references are resolved against the directory of the file
//! they appear in, so chains like `./a.json -> ../shared/b.json` work.
//! Sibling branches resolve concurrently; results are assembled in document
//! order.

use futures::future::{BoxFuture, FutureExt, try_join_all};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cairn_core::schema::REF_KEY;
use cairn_core::{SchemaMap, SchemaNode};

use crate::catalog::{CatalogLookup, HttpCatalog, UnconfiguredCatalog, unwrap_definition};
use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::http::HttpFetcher;
use crate::reference::Reference;

/// Everything a resolution needs, threaded through each recursive call
#[derive(Clone)]
pub struct ResolveContext {
    cwd: PathBuf,
    catalog: Arc<dyn CatalogLookup>,
    fetcher: HttpFetcher,
    /// Documents currently being resolved on this branch, outermost first
    chain: Vec<String>,
}

impl std::fmt::Debug for ResolveContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveContext")
            .field("cwd", &self.cwd)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl ResolveContext {
    /// Context with default HTTP settings and no catalog
    pub fn new(cwd: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            cwd: cwd.into(),
            catalog: Arc::new(UnconfiguredCatalog),
            fetcher: HttpFetcher::new(&ResolverConfig::default())?,
            chain: Vec::new(),
        })
    }

    /// Context built from configuration
    ///
    /// An HTTP catalog is wired in when `catalog_url` is set.
    pub fn from_config(cwd: impl Into<PathBuf>, config: &ResolverConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config)?;
        let catalog: Arc<dyn CatalogLookup> = match HttpCatalog::from_config(config, fetcher.clone()) {
            Some(catalog) => Arc::new(catalog),
            None => Arc::new(UnconfiguredCatalog),
        };

        Ok(Self {
            cwd: cwd.into(),
            catalog,
            fetcher,
            chain: Vec::new(),
        })
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogLookup>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Enter a referenced document, failing if this branch is already inside it
    ///
    /// Files are keyed by canonical path, URLs as written and catalog
    /// entries as `catalog:<name>`.
    fn enter(&self, key: String) -> Result<Self> {
        if self.chain.contains(&key) {
            let chain = self
                .chain
                .iter()
                .chain(std::iter::once(&key))
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ResolveError::CircularReference { chain });
        }

        let mut child = self.clone();
        child.chain.push(key);
        Ok(child)
    }

    /// Enter a referenced file: rebind `cwd` and extend the chain
    fn descend(&self, path: &Path) -> Result<Self> {
        let canonical = std::fs::canonicalize(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ResolveError::NotFound {
                path: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
            },
            _ => ResolveError::Io(e),
        })?;

        let mut child = self.enter(canonical.display().to_string())?;
        child.cwd = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone());
        Ok(child)
    }
}

/// Resolve every `$ref` in `node`
pub fn resolve<'a>(node: &'a SchemaNode, ctx: &'a ResolveContext) -> BoxFuture<'a, Result<SchemaNode>> {
    async move {
        match node {
            SchemaNode::Array(items) => {
                let resolved = try_join_all(items.iter().map(|item| resolve(item, ctx))).await?;
                Ok(SchemaNode::Array(resolved))
            }
            SchemaNode::Object(map) => match node.ref_target()? {
                Some(target) => resolve_reference(target, map, ctx).await,
                None => Ok(SchemaNode::Object(resolve_map(map, ctx).await?)),
            },
            scalar => Ok(scalar.clone()),
        }
    }
    .boxed()
}

async fn resolve_map(map: &SchemaMap, ctx: &ResolveContext) -> Result<SchemaMap> {
    let values = try_join_all(map.values().map(|value| resolve(value, ctx))).await?;
    Ok(map.keys().cloned().zip(values).collect())
}

async fn resolve_reference(target: &str, local: &SchemaMap, ctx: &ResolveContext) -> Result<SchemaNode> {
    let reference = Reference::classify(target).ok_or_else(|| ResolveError::UnsupportedReference {
        reference: target.to_string(),
    })?;

    tracing::debug!(reference = %reference, cwd = %ctx.cwd.display(), "resolving reference");

    let (fetched, child) = match reference {
        Reference::Fragment(_) => return Ok(SchemaNode::Object(resolve_map(local, ctx).await?)),
        Reference::RelativeFile(relative) => {
            let path = ctx.cwd.join(relative);
            let child = ctx.descend(&path)?;
            (load_file(&path).await?, child)
        }
        Reference::Http(url) => {
            let child = ctx.enter(url.to_string())?;
            (ctx.fetcher.fetch(url).await?, child)
        }
        Reference::Catalog(name) => {
            let child = ctx.enter(format!("catalog:{name}"))?;
            (unwrap_definition(ctx.catalog.lookup(name).await?), child)
        }
    };

    if fetched.as_object().is_none() {
        return Err(ResolveError::SchemaShape {
            reference: target.to_string(),
            message: format!("expected an object, found {}", fetched.kind()),
        });
    }

    let siblings: SchemaMap = local
        .iter()
        .filter(|(key, _)| key.as_str() != REF_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let (referenced, siblings) =
        futures::try_join!(resolve(&fetched, &child), resolve_map(&siblings, ctx))?;

    let SchemaNode::Object(mut merged) = referenced else {
        return Err(ResolveError::SchemaShape {
            reference: target.to_string(),
            message: format!("resolved to {}, not an object", referenced.kind()),
        });
    };

    for (key, value) in siblings {
        merged.insert(key, value);
    }

    Ok(SchemaNode::Object(merged))
}

async fn load_file(path: &Path) -> Result<SchemaNode> {
    let content = tokio::fs::read_to_string(path).await?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );

    let parsed = if is_yaml {
        SchemaNode::from_yaml_str(&content)
    } else {
        SchemaNode::from_json_str(&content)
    };

    parsed.map_err(|e| ResolveError::Parse {
        source_name: path.display().to_string(),
        message: e.to_string(),
    })
}
