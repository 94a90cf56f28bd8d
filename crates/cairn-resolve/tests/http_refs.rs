//! HTTP reference and catalog resolution against a mock server

use std::sync::Arc;

use cairn_core::SchemaNode;
use cairn_resolve::{
    CatalogLookup, HttpCatalog, HttpFetcher, ResolveContext, ResolveError, ResolverConfig, resolve,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn node(value: serde_json::Value) -> SchemaNode {
    SchemaNode::from(value)
}

#[tokio::test]
async fn test_http_ref_resolves_and_merges() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schemas/size.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "string",
            "title": "Remote title"
        })))
        .mount(&server)
        .await;

    let ctx = ResolveContext::new(".").unwrap();
    let schema = node(json!({
        "properties": {
            "size": {
                "$ref": format!("{}/schemas/size.json", server.uri()),
                "title": "Local title"
            }
        }
    }));

    let resolved = resolve(&schema, &ctx).await.unwrap();
    assert_eq!(
        resolved,
        node(json!({"properties": {"size": {"type": "string", "title": "Local title"}}}))
    );
}

#[tokio::test]
async fn test_http_ref_non_200_is_remote_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing.json", server.uri());
    let ctx = ResolveContext::new(".").unwrap();

    let err = resolve(&node(json!({"$ref": url.clone()})), &ctx)
        .await
        .unwrap_err();

    match err {
        ResolveError::RemoteFetch { url: got, status } => {
            assert_eq!(got, url);
            assert_eq!(status, "404 Not Found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_http_catalog_sends_token_and_unwraps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/definitions/aws-iam-role"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "aws-iam-role",
            "schema": {
                "type": "object",
                "properties": {"arn": {"type": "string"}}
            }
        })))
        .mount(&server)
        .await;

    let config = ResolverConfig {
        catalog_url: Some(server.uri()),
        catalog_token: Some("s3cret".to_string()),
        ..Default::default()
    };
    let ctx = ResolveContext::from_config(".", &config).unwrap();

    let resolved = resolve(&node(json!({"$ref": "aws-iam-role"})), &ctx)
        .await
        .unwrap();
    assert_eq!(
        resolved,
        node(json!({"type": "object", "properties": {"arn": {"type": "string"}}}))
    );
}

#[tokio::test]
async fn test_http_catalog_lookup_direct() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/definitions/network"))
        .respond_with(ResponseTemplate::new(200).set_body_string("type: object\n"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&ResolverConfig::default()).unwrap();
    let catalog: Arc<dyn CatalogLookup> = Arc::new(HttpCatalog::new(server.uri(), None, fetcher));

    let document = catalog.lookup("network").await.unwrap();
    assert_eq!(document.type_name(), Some("object"));
}

#[tokio::test]
async fn test_unconfigured_catalog_reference_fails() {
    let ctx = ResolveContext::new(".").unwrap();
    let err = resolve(&node(json!({"$ref": "aws-iam-role"})), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Catalog { ref name, .. } if name == "aws-iam-role"));
}

#[tokio::test]
async fn test_self_referencing_url_is_circular() {
    let server = MockServer::start().await;
    let url = format!("{}/a.json", server.uri());
    Mock::given(method("GET"))
        .and(path("/a.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {"x": {"$ref": url.clone()}}
        })))
        .mount(&server)
        .await;

    let ctx = ResolveContext::new(".").unwrap();
    let err = resolve(&node(json!({"$ref": url.clone()})), &ctx)
        .await
        .unwrap_err();

    match err {
        ResolveError::CircularReference { chain } => {
            assert_eq!(chain, format!("{url} -> {url}"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
