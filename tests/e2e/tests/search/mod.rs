#[path = "../common/mod.rs"]
mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn searching_for_overlapping_terms_surfaces_the_matching_engram() {
    let app = TestApp::new();
    app.post("/engrams", json!({"content": "I love hiking in the mountains"})).await;
    app.post("/engrams", json!({"content": "I enjoy cooking Italian food"})).await;
    app.post("/engrams", json!({"content": "The quarterly report is due Friday"})).await;

    let (status, body) = app.post("/engrams/search", json!({"query": "hiking", "minFinalScore": 0.0})).await;
    assert_eq!(status, 200);
    let hits = body["hits"].as_array().unwrap();
    assert!(!hits.is_empty());
    assert!(hits[0]["engram"]["content"].as_str().unwrap().contains("hiking"));
}

#[tokio::test]
async fn searching_with_no_overlap_and_default_threshold_is_empty() {
    let app = TestApp::new();
    app.post("/engrams", json!({"content": "I love hiking in the mountains"})).await;
    app.post("/engrams", json!({"content": "I enjoy cooking Italian food"})).await;
    app.post("/engrams", json!({"content": "The quarterly report is due Friday"})).await;

    let (status, body) = app.post("/engrams/search", json!({"query": "xyzzy plugh wibble"})).await;
    assert_eq!(status, 200);
    assert!(body["hits"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app.post("/engrams/search", json!({"query": "  "})).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn ingesting_duplicate_content_reinforces_instead_of_duplicating() {
    let app = TestApp::new();
    let (_, first) = app.post("/engrams", json!({"content": "I love hiking in the mountains"})).await;
    let (_, second) = app.post("/engrams", json!({"content": "I love hiking in the mountains"})).await;

    assert_eq!(first["engrams"][0]["id"], second["engrams"][0]["id"]);

    let (_, list) = app.get("/engrams").await;
    assert_eq!(list["engrams"].as_array().unwrap().len(), 1);
}
