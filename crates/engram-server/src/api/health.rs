//! `GET /health`, `GET /status`, `POST /decay/run`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::dto::{DecayRunResponse, StatsResponse};
use super::error::ApiError;
use super::extract::OwnerId;
use super::state::AppState;

/// No owner scoping — a liveness probe against the store itself.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.engine.health_check().await?;
    Ok(StatusCode::OK)
}

pub async fn stats(State(state): State<Arc<AppState>>, OwnerId(owner_id): OwnerId) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.engine.stats(&owner_id).await?;
    Ok(Json(stats.into()))
}

pub async fn run_decay(State(state): State<Arc<AppState>>, OwnerId(owner_id): OwnerId) -> Result<Json<DecayRunResponse>, ApiError> {
    let affected = state.engine.run_decay(&owner_id).await?;
    Ok(Json(DecayRunResponse { affected }))
}
