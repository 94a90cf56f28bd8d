//! HTTP fetching of remote schema documents

use std::sync::Arc;
use tokio::sync::Semaphore;

use cairn_core::SchemaNode;

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};

/// Fetches schema documents over HTTP(S)
///
/// Cheap to clone; clones share the connection pool and the concurrency
/// limit.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    limiter: Arc<Semaphore>,
}

impl HttpFetcher {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("cairn/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolveError::InvalidConfig {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_fetches)),
        })
    }

    /// GET a schema document
    pub async fn fetch(&self, url: &str) -> Result<SchemaNode> {
        self.fetch_with_token(url, None).await
    }

    /// GET a schema document, optionally with a bearer token
    ///
    /// Anything other than `200 OK` is a [`ResolveError::RemoteFetch`].
    pub async fn fetch_with_token(&self, url: &str, token: Option<&str>) -> Result<SchemaNode> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| ResolveError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(url, "fetching remote schema");

        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResolveError::transport(url, e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ResolveError::RemoteFetch {
                url: url.to_string(),
                status: status.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::transport(url, e))?;

        parse_document(url, &body)
    }
}

/// Parse a fetched body as JSON, falling back to YAML
fn parse_document(url: &str, body: &str) -> Result<SchemaNode> {
    match SchemaNode::from_json_str(body) {
        Ok(node) => Ok(node),
        Err(json_err) => SchemaNode::from_yaml_str(body).map_err(|_| ResolveError::Parse {
            source_name: url.to_string(),
            message: json_err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_json_and_yaml() {
        let json = parse_document("u", r#"{"type": "string"}"#).unwrap();
        assert_eq!(json.type_name(), Some("string"));

        let yaml = parse_document("u", "type: number\n").unwrap();
        assert_eq!(yaml.type_name(), Some("number"));
    }

    #[test]
    fn test_parse_document_garbage() {
        let err = parse_document("https://x/y", "{ nope: [").unwrap_err();
        assert!(matches!(err, ResolveError::Parse { ref source_name, .. } if source_name == "https://x/y"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ResolverConfig {
            max_concurrent_fetches: 0,
            ..Default::default()
        };
        assert!(HttpFetcher::new(&config).is_err());
    }
}
