//! REST transport: a flat route table, one `AppState`, CORS + tracing
//! layered via `ServiceBuilder`.

pub mod chronicles;
pub mod dto;
pub mod engrams;
pub mod error;
pub mod extract;
pub mod health;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/engrams", post(engrams::create_engram).get(engrams::list_engrams))
        .route("/engrams/search", post(engrams::search_engrams))
        .route("/engrams/{id}", get(engrams::get_engram).patch(engrams::update_engram).delete(engrams::delete_engram))
        .route("/engrams/{id}/reinforce", post(engrams::reinforce_engram))
        .route("/chronicles", post(chronicles::record_fact).get(chronicles::query_chronicles))
        .route("/chronicles/current", get(chronicles::current_chronicles))
        .route("/chronicles/timeline", get(chronicles::timeline))
        .route("/chronicles/{id}", get(chronicles::get_chronicle).patch(chronicles::update_chronicle).delete(chronicles::delete_chronicle))
        .route("/chronicles/{id}/related", get(chronicles::related_chronicles))
        .route("/nexuses", post(chronicles::link_chronicles))
        .route("/health", get(health::health_check))
        .route("/status", get(health::stats))
        .route("/decay/run", post(health::run_decay))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}
