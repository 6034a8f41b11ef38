#[path = "../common/mod.rs"]
mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn recording_same_attribute_twice_expires_the_prior_value() {
    let app = TestApp::new();

    let (status, first) = app.post("/chronicles", json!({"entity": "speaker", "attribute": "phone", "value": "Samsung"})).await;
    assert_eq!(status, 201);
    assert!(first["effectiveUntil"].is_null());
    let first_id = first["id"].as_str().unwrap().to_string();

    let (status, second) = app.post("/chronicles", json!({"entity": "speaker", "attribute": "phone", "value": "iPhone"})).await;
    assert_eq!(status, 201);
    assert!(second["effectiveUntil"].is_null());

    let (status, refreshed_first) = app.get(&format!("/chronicles/{first_id}")).await;
    assert_eq!(status, 200);
    assert!(!refreshed_first["effectiveUntil"].is_null());

    let (status, current) = app.get("/chronicles/current?entity=speaker").await;
    assert_eq!(status, 200);
    let current = current["chronicles"].as_array().unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["value"], "iPhone");

    let (status, timeline) = app.get("/chronicles/timeline?entity=speaker").await;
    assert_eq!(status, 200);
    let timeline = timeline["chronicles"].as_array().unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0]["value"], "Samsung");
    assert_eq!(timeline[1]["value"], "iPhone");
}

#[tokio::test]
async fn update_and_expire_chronicle() {
    let app = TestApp::new();
    let (_, c) = app.post("/chronicles", json!({"entity": "e", "attribute": "a", "value": "v1"})).await;
    let id = c["id"].as_str().unwrap().to_string();

    let (status, updated) = app.patch(&format!("/chronicles/{id}"), json!({"certainty": 0.5})).await;
    assert_eq!(status, 200);
    assert_eq!(updated["certainty"].as_f64().unwrap(), 0.5);

    let (status, _) = app.delete(&format!("/chronicles/{id}")).await;
    assert_eq!(status, 204);

    let (_, fetched) = app.get(&format!("/chronicles/{id}")).await;
    assert!(!fetched["effectiveUntil"].is_null());
}

#[tokio::test]
async fn linking_two_chronicles_is_bidirectional_in_related() {
    let app = TestApp::new();
    let (_, a) = app.post("/chronicles", json!({"entity": "e1", "attribute": "a1", "value": "v1"})).await;
    let (_, b) = app.post("/chronicles", json!({"entity": "e2", "attribute": "a2", "value": "v2"})).await;
    let a_id = a["id"].as_str().unwrap().to_string();
    let b_id = b["id"].as_str().unwrap().to_string();

    let (status, _) = app.post("/nexuses", json!({"originId": a_id, "linkedId": b_id, "bondType": "related_to"})).await;
    assert_eq!(status, 201);

    let (_, related_from_a) = app.get(&format!("/chronicles/{a_id}/related")).await;
    assert_eq!(related_from_a["chronicles"].as_array().unwrap().len(), 1);
    assert_eq!(related_from_a["chronicles"][0]["id"], b_id);

    let (_, related_from_b) = app.get(&format!("/chronicles/{b_id}/related")).await;
    assert_eq!(related_from_b["chronicles"].as_array().unwrap().len(), 1);
    assert_eq!(related_from_b["chronicles"][0]["id"], a_id);
}

#[tokio::test]
async fn linking_a_chronicle_to_itself_is_rejected() {
    let app = TestApp::new();
    let (_, c) = app.post("/chronicles", json!({"entity": "e", "attribute": "a", "value": "v"})).await;
    let id = c["id"].as_str().unwrap().to_string();

    let (status, _) = app.post("/nexuses", json!({"originId": id.clone(), "linkedId": id, "bondType": "related_to"})).await;
    assert_eq!(status, 400);
}
