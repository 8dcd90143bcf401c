//! Sharing and resolving snippets across tiers, through the HTTP surface

#![cfg(unix)]

use joyplay_store::{LocalBackend, MemoryBackend, SnippetId, SnippetStore, UpstreamBackend, UpstreamConfig};
use joyplay_tests::common::{playground, serve};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn upstream_with(id: &str, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/p/{id}.go")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

fn upstream_tier(server: &MockServer) -> UpstreamBackend {
    UpstreamBackend::new(&UpstreamConfig {
        base_url: format!("{}/p/", server.uri()),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_shared_snippet_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let body = "package main\necho persisted\n";

    let first = SnippetStore::new(LocalBackend::open(dir.path()).await.unwrap());
    let id = first.store(body.as_bytes()).await.unwrap();
    drop(first);

    let second = SnippetStore::new(LocalBackend::open(dir.path()).await.unwrap());
    assert_eq!(second.resolve(id.as_str()).await.unwrap(), body.as_bytes());
}

#[tokio::test]
async fn test_upstream_snippet_over_http() {
    let upstream = upstream_with("IAAEPbTy59", "package main\necho from upstream\n").await;
    let store = SnippetStore::new(MemoryBackend::new()).with_tier(upstream_tier(&upstream));
    let playground = playground(store, Duration::from_secs(2));
    let (url, _server) = serve(playground.clone()).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{url}/p/IAAEPbTy59")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "package main\necho from upstream\n");

    let response = client.get(format!("{url}/p/ZZZZZZZZZZ")).send().await.unwrap();
    assert_eq!(response.status(), 404);

    playground.shutdown_token().cancel();
}

#[tokio::test]
async fn test_share_over_http_matches_derived_id() {
    let upstream = upstream_with("IAAEPbTy59", "unused").await;
    let store = SnippetStore::new(MemoryBackend::new()).with_tier(upstream_tier(&upstream));
    let playground = playground(store, Duration::from_secs(2));
    let (url, _server) = serve(playground.clone()).await;
    let client = reqwest::Client::new();
    let body = "package main\necho shared\n";

    let first = client
        .post(format!("{url}/share"))
        .body(body)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let second = client
        .post(format!("{url}/share"))
        .body(body)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, SnippetId::for_body(body.as_bytes()).to_string());

    // Nothing was written upstream.
    let requests = upstream.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));

    playground.shutdown_token().cancel();
}
