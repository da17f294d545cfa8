//! The relay served over TCP with graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use toolshelf_core::relay::{RateLimitConfig, RelayError, RelayState, serve};
use toolshelf_test_utils::config::TestConfigBuilder;
use toolshelf_test_utils::fixtures::ScriptedProvider;
use toolshelf_test_utils::tracing_setup::init_test_tracing;

/// A port that was free a moment ago.
async fn free_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_serve_answers_and_shuts_down() {
    init_test_tracing();
    let port = free_port().await;
    let config = TestConfigBuilder::new()
        .relay_addr("127.0.0.1")
        .relay_port(port)
        .route("/api/chat")
        .build();
    let provider = Arc::new(ScriptedProvider::new("openrouter").reply(
        "Use Vercel.",
        "deepseek/deepseek-chat-v3-0324:free",
    ));
    let state = Arc::new(
        RelayState::new(RateLimitConfig::default(), "gw-model").with_openrouter(provider),
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        serve(&config, state, async move {
            let _ = stop_rx.await;
        })
        .await
    });

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{port}");
    let mut health = None;
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base}/health")).send().await {
            health = Some(resp);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let health: Value = health.unwrap().json().await.unwrap();
    assert_eq!(health["status"], "ok");

    let resp = client
        .post(format!("{base}/api/chat"))
        .json(&json!({"message": "where do I deploy", "provider": "openrouter"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["access-control-allow-origin"].to_str().unwrap(),
        "*"
    );
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["reply"], "Use Vercel.");
    assert_eq!(body["model"], "deepseek/deepseek-chat-v3-0324:free");

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_serve_reports_bind_failure() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = TestConfigBuilder::new()
        .relay_addr("127.0.0.1")
        .relay_port(taken.local_addr().unwrap().port())
        .build();
    let state = Arc::new(RelayState::new(RateLimitConfig::default(), "gw-model"));

    let err = serve(&config, state, std::future::pending()).await.unwrap_err();

    match err {
        RelayError::Bind { addr, .. } => assert!(addr.starts_with("127.0.0.1:")),
        other => panic!("expected a bind error, got {other:?}"),
    }
}
