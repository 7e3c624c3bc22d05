// Shared helpers for the HTTP-level tests.
//
// Every test talks to a wiremock server standing in for the Content Safety
// resource. Retry delays are shortened so exhausted-retry cases stay fast.
#![allow(dead_code)]

use std::time::Duration;

use content_safety::{ContentSafetyClient, ContentSafetyConfig};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_VERSION: &str = "2024-09-01";
pub const API_KEY: &str = "test-key";

/// Route client logs to the test output (RUST_LOG=content_safety=debug).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config(server: &MockServer) -> ContentSafetyConfig {
    ContentSafetyConfig::new(server.uri(), API_KEY).with_retry(3, Duration::from_millis(5))
}

pub fn client(server: &MockServer) -> ContentSafetyClient {
    init_tracing();
    ContentSafetyClient::new(config(server)).unwrap()
}

/// A client pointed at a port nothing listens on.
pub fn unreachable_client() -> ContentSafetyClient {
    init_tracing();
    let config = ContentSafetyConfig::new("http://127.0.0.1:9", API_KEY)
        .with_retry(3, Duration::from_millis(5))
        .with_request_timeout(Duration::from_secs(2));
    ContentSafetyClient::new(config).unwrap()
}

/// An analyze response with the given (category, severity) pairs.
pub fn analysis(scores: &[(&str, u8)]) -> Value {
    let categories: Vec<Value> = scores
        .iter()
        .map(|(category, severity)| json!({"category": category, "severity": severity}))
        .collect();
    json!({ "categoriesAnalysis": categories })
}

pub fn clean_analysis() -> Value {
    analysis(&[("Hate", 0), ("SelfHarm", 0), ("Sexual", 0), ("Violence", 0)])
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}
