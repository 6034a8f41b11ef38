//! Shared test harness: builds the real axum router over an in-memory
//! store and drives it with `tower::ServiceExt::oneshot` — a fresh,
//! disposable backend per test, no network socket involved.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use engram_core::completion::NativeCompletionProvider;
use engram_core::config::EngineConfig;
use engram_core::embed::HashEmbedder;
use engram_core::store::memory::MemoryStore;
use engram_server::api::state::AppState;
use engram_server::api::build_router;
use engram_core::Engine;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const OWNER: &str = "test-owner";
pub const DIMENSIONS: usize = 32;

pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(HashEmbedder::new(DIMENSIONS));
        let completion = Arc::new(NativeCompletionProvider);
        let config = EngineConfig::new(DIMENSIONS);
        let engine = Arc::new(Engine::new(store, embedder, completion, config));
        let state = Arc::new(AppState { engine });
        Self { router: build_router(state) }
    }

    pub async fn request(&self, method: &str, path: &str, owner: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path).header("content-type", "application/json");
        if let Some(owner) = owner {
            builder = builder.header("x-owner-id", owner);
        }
        let body = match body {
            Some(v) => Body::from(serde_json::to_vec(&v).unwrap()),
            None => Body::empty(),
        };
        let request = builder.body(body).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", path, Some(OWNER), Some(body)).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request("GET", path, Some(OWNER), None).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", path, Some(OWNER), Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.request("DELETE", path, Some(OWNER), None).await
    }
}
