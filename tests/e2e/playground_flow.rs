//! Full playground flow: compile, format, share, resolve, render, shutdown

#![cfg(unix)]

use joyplay_store::{MemoryBackend, SnippetStore};
use joyplay_tests::common::{playground, program, serve};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

async fn compile(client: &reqwest::Client, url: &str, source: &str) -> (u16, String) {
    let response = client
        .post(format!("{url}/compile"))
        .body(json!({ "body": source }).to_string())
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_compile_share_render() {
    let playground = playground(SnippetStore::new(MemoryBackend::new()), Duration::from_secs(2));
    let (url, _server) = serve(playground.clone()).await;
    let client = reqwest::Client::new();
    let source = program(&["echo out", "sleep 0.1", "echo err >&2", "sleep 0.05", "echo console.log"]);

    let (status, body) = compile(&client, &url, &source).await;
    assert_eq!(status, 200);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["Errors"], "");
    let events = response["Events"].as_array().unwrap();
    let kinds: Vec<_> = events.iter().map(|e| e["Kind"].as_str().unwrap()).collect();
    let messages: String = events.iter().map(|e| e["Message"].as_str().unwrap()).collect();
    assert_eq!(messages, "out\nerr\nconsole.log\n");
    assert_eq!(kinds.first(), Some(&"stdout"));
    assert!(kinds.contains(&"stderr"));
    let total: u64 = events.iter().map(|e| e["Delay"].as_u64().unwrap()).sum();
    assert!(total >= 100_000_000, "delays should cover the sleep, got {total}ns");

    let id = client
        .post(format!("{url}/share"))
        .body(source.clone())
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let fetched = client.get(format!("{url}/p/{id}")).send().await.unwrap();
    assert_eq!(fetched.text().await.unwrap(), source);

    let page = client.get(format!("{url}/js/{id}")).send().await.unwrap();
    assert_eq!(page.status(), 200);
    let page = page.text().await.unwrap();
    assert!(page.contains("echo window.joyOutput.log"));
    assert!(!page.contains("package main"));

    playground.shutdown_token().cancel();
}

#[tokio::test]
async fn test_runaway_program_reports_timeout() {
    let playground = playground(
        SnippetStore::new(MemoryBackend::new()),
        Duration::from_millis(300),
    );
    let (url, _server) = serve(playground.clone()).await;
    let client = reqwest::Client::new();

    let started = Instant::now();
    let (status, body) = compile(&client, &url, &program(&["echo start", "sleep 30"])).await;
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(status, 200);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["Errors"], "process took too long");
    assert!(response["Events"].is_null());

    playground.shutdown_token().cancel();
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_run() {
    let playground = playground(SnippetStore::new(MemoryBackend::new()), Duration::from_secs(30));
    let (url, server) = serve(playground.clone()).await;
    let client = reqwest::Client::new();

    let request = {
        let client = client.clone();
        let url = url.clone();
        tokio::spawn(async move { compile(&client, &url, &program(&["sleep 30"])).await })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;
    let started = Instant::now();
    playground.shutdown_token().cancel();

    let (status, body) = tokio::time::timeout(Duration::from_secs(5), request)
        .await
        .expect("in-flight request should finish after shutdown")
        .unwrap();
    assert_eq!(status, 500);
    assert_eq!(body, "Server error.");

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after draining")
        .unwrap()
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_rejected_sources() {
    let playground = playground(SnippetStore::new(MemoryBackend::new()), Duration::from_secs(2));
    let (url, _server) = serve(playground.clone()).await;
    let client = reqwest::Client::new();

    for (source, expected) in [
        ("echo no clause\n", "expected 'package' clause"),
        ("package lib\necho hi\n", "package name must be main"),
    ] {
        let (status, body) = compile(&client, &url, source).await;
        assert_eq!(status, 200);
        let response: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(response["Errors"], expected, "{source:?}");
        assert!(response["Events"].is_null());
    }

    playground.shutdown_token().cancel();
}

#[tokio::test]
async fn test_format_then_share_formatted_body() {
    let playground = playground(SnippetStore::new(MemoryBackend::new()), Duration::from_secs(2));
    let (url, _server) = serve(playground.clone()).await;
    let client = reqwest::Client::new();

    let body = client
        .post(format!("{url}/fmt"))
        .body(json!({ "body": "package   main\necho   hi\n", "imports": false }).to_string())
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["Error"], "");
    let formatted = response["Body"].as_str().unwrap();
    assert_eq!(formatted, "package main\necho hi\n");

    let id = client
        .post(format!("{url}/share"))
        .body(formatted.to_string())
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let fetched = client.get(format!("{url}/p/{id}")).send().await.unwrap();
    assert_eq!(fetched.text().await.unwrap(), formatted);

    playground.shutdown_token().cancel();
}
