#[path = "../common/mod.rs"]
mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_list_get_patch_delete_round_trip() {
    let app = TestApp::new();

    let (status, body) = app.post("/engrams", json!({"content": "I love hiking in the mountains"})).await;
    assert_eq!(status, 201);
    let engrams = body["engrams"].as_array().unwrap();
    assert_eq!(engrams.len(), 1);
    let id = engrams[0]["id"].as_str().unwrap().to_string();

    let (status, body) = app.get("/engrams").await;
    assert_eq!(status, 200);
    assert_eq!(body["engrams"].as_array().unwrap().len(), 1);

    let (status, body) = app.get(&format!("/engrams/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], id);

    let (status, body) = app.patch(&format!("/engrams/{id}"), json!({"tags": ["outdoors"]})).await;
    assert_eq!(status, 200);
    assert_eq!(body["tags"][0], "outdoors");
    assert_eq!(body["version"], 2);

    let (status, _) = app.delete(&format!("/engrams/{id}")).await;
    assert_eq!(status, 204);

    let (status, _) = app.get(&format!("/engrams/{id}")).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn missing_owner_header_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app.request("POST", "/engrams", None, Some(json!({"content": "no owner"}))).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app.post("/engrams", json!({"content": "   "})).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn reinforce_saturates_at_one() {
    let app = TestApp::new();
    let (_, body) = app.post("/engrams", json!({"content": "a standalone fact"})).await;
    let id = body["engrams"][0]["id"].as_str().unwrap().to_string();

    for _ in 0..20 {
        let (status, _) = app.post(&format!("/engrams/{id}/reinforce"), json!({})).await;
        assert_eq!(status, 200);
    }

    let (_, body) = app.get(&format!("/engrams/{id}")).await;
    assert_eq!(body["signal"].as_f64().unwrap(), 1.0);
}

#[tokio::test]
async fn reinforcing_unknown_engram_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app.post("/engrams/does-not-exist/reinforce", json!({})).await;
    assert_eq!(status, 404);
}
