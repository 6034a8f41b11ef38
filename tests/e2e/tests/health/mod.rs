#[path = "../common/mod.rs"]
mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn health_check_succeeds_against_a_fresh_store() {
    let app = TestApp::new();
    let (status, _) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn status_reports_counts_after_ingestion() {
    let app = TestApp::new();
    app.post("/engrams", json!({"content": "I love hiking in the mountains"})).await;
    app.post("/engrams", json!({"content": "I enjoy cooking Italian food"})).await;

    let (status, body) = app.get("/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["engramCount"], 2);
    assert_eq!(body["synapseCount"], 1);
}

#[tokio::test]
async fn decay_run_reduces_signal_of_existing_engrams() {
    let app = TestApp::new();
    let (_, created) = app.post("/engrams", json!({"content": "a decaying fact"})).await;
    let id = created["engrams"][0]["id"].as_str().unwrap().to_string();

    let (status, result) = app.post("/decay/run", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(result["affected"], 1);

    let (_, after) = app.get(&format!("/engrams/{id}")).await;
    assert!(after["signal"].as_f64().unwrap() < 0.5);
}
