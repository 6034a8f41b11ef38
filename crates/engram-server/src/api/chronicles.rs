//! `POST/GET/PATCH/DELETE /chronicles`, `GET /chronicles/current`,
//! `GET /chronicles/timeline`, `GET /chronicles/:id/related`,
//! `POST /nexuses`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use engram_core::store::ChronicleFilter;

use super::dto::{
    ChronicleListResponse, ChronicleQuery, CurrentChroniclesQuery, LinkChroniclesRequest, NexusResponse, RecordFactRequest, TimelineQuery,
    UpdateChronicleRequest,
};
use super::error::ApiError;
use super::extract::OwnerId;
use super::state::AppState;

pub async fn record_fact(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<RecordFactRequest>,
) -> Result<(StatusCode, Json<engram_core::model::Chronicle>), ApiError> {
    if body.entity.trim().is_empty() || body.attribute.trim().is_empty() {
        return Err(ApiError::bad_request("entity and attribute must not be empty"));
    }

    let certainty = body.certainty.unwrap_or(1.0);
    let chronicle = state
        .engine
        .record_fact(&owner_id, &body.entity, &body.attribute, &body.value, certainty, body.effective_from, body.metadata)
        .await?;
    Ok((StatusCode::CREATED, Json(chronicle)))
}

pub async fn query_chronicles(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Query(params): Query<ChronicleQuery>,
) -> Result<Json<ChronicleListResponse>, ApiError> {
    let filter = ChronicleFilter { entity: params.entity, attribute: params.attribute, at: params.at, from: params.from, to: params.to };
    let chronicles = state.engine.query_chronicles(&owner_id, filter).await?;
    Ok(Json(ChronicleListResponse { chronicles }))
}

pub async fn get_chronicle(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
) -> Result<Json<engram_core::model::Chronicle>, ApiError> {
    match state.engine.get_chronicle(&owner_id, &id).await? {
        Some(chronicle) => Ok(Json(chronicle)),
        None => Err(ApiError::not_found(format!("no chronicle {id}"))),
    }
}

pub async fn update_chronicle(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
    Json(body): Json<UpdateChronicleRequest>,
) -> Result<Json<engram_core::model::Chronicle>, ApiError> {
    let mut chronicle =
        state.engine.get_chronicle(&owner_id, &id).await?.ok_or_else(|| ApiError::not_found(format!("no chronicle {id}")))?;

    if let Some(value) = body.value {
        chronicle.value = value;
    }
    if let Some(certainty) = body.certainty {
        chronicle.certainty = certainty.clamp(0.0, 1.0);
    }
    if let Some(effective_until) = body.effective_until {
        chronicle.effective_until = Some(effective_until);
    }

    let updated = state.engine.update_chronicle(chronicle).await?;
    Ok(Json(updated))
}

pub async fn delete_chronicle(State(state): State<Arc<AppState>>, OwnerId(owner_id): OwnerId, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.engine.expire_chronicle(&owner_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_chronicles(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Query(params): Query<CurrentChroniclesQuery>,
) -> Result<Json<ChronicleListResponse>, ApiError> {
    let chronicles = state.engine.current_chronicles(&owner_id, params.entity.as_deref()).await?;
    Ok(Json(ChronicleListResponse { chronicles }))
}

pub async fn timeline(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Query(params): Query<TimelineQuery>,
) -> Result<Json<ChronicleListResponse>, ApiError> {
    let chronicles = state.engine.timeline(&owner_id, &params.entity).await?;
    Ok(Json(ChronicleListResponse { chronicles }))
}

pub async fn related_chronicles(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
) -> Result<Json<ChronicleListResponse>, ApiError> {
    let chronicles = state.engine.related_chronicles(&owner_id, &id).await?;
    Ok(Json(ChronicleListResponse { chronicles }))
}

pub async fn link_chronicles(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<LinkChroniclesRequest>,
) -> Result<(StatusCode, Json<NexusResponse>), ApiError> {
    if body.origin_id.trim().is_empty() || body.linked_id.trim().is_empty() {
        return Err(ApiError::bad_request("originId and linkedId must not be empty"));
    }
    if body.origin_id == body.linked_id {
        return Err(ApiError::bad_request("originId and linkedId must differ"));
    }

    let strength = body.strength.unwrap_or(1.0);
    let nexus = state.engine.link_chronicles(&owner_id, &body.origin_id, &body.linked_id, &body.bond_type, strength, body.metadata).await?;
    Ok((StatusCode::CREATED, Json(NexusResponse { nexus })))
}
