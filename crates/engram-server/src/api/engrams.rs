//! `POST/GET /engrams`, `GET/PATCH/DELETE /engrams/:id`, `POST
//! /engrams/search`, `POST /engrams/:id/reinforce`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use engram_core::dedup::content_hash;
use engram_core::ingest::AddMemoryOptions;
use engram_core::model::Strand;
use engram_core::retrieval::SearchOptions;

use super::dto::{
    CreateEngramRequest, CreateEngramResponse, EngramListResponse, ListEngramsQuery, SearchRequest, SearchResponse, UpdateEngramRequest,
};
use super::error::ApiError;
use super::extract::OwnerId;
use super::state::AppState;

pub async fn create_engram(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<CreateEngramRequest>,
) -> Result<(StatusCode, Json<CreateEngramResponse>), ApiError> {
    if body.content.trim().is_empty() {
        return Err(ApiError::bad_request("content must not be empty"));
    }

    let options = AddMemoryOptions {
        strand: body.strand.as_deref().map(Strand::parse_name),
        tags: body.tags,
        metadata: body.metadata,
        signal: body.signal,
        pulse_rate: body.pulse_rate,
    };

    let engrams = state.engine.add_memory(&owner_id, &body.content, options).await?;
    Ok((StatusCode::CREATED, Json(CreateEngramResponse { engrams })))
}

pub async fn list_engrams(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Query(params): Query<ListEngramsQuery>,
) -> Result<Json<EngramListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(50);
    let offset = params.offset.unwrap_or(0);
    let strand = params.strand.as_deref().map(Strand::parse_name);
    let engrams = state.engine.list_engrams(&owner_id, limit, offset, strand).await?;
    Ok(Json(EngramListResponse { engrams }))
}

pub async fn get_engram(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
) -> Result<Json<engram_core::model::Engram>, ApiError> {
    match state.engine.get_engram(&owner_id, &id).await? {
        Some(engram) => Ok(Json(engram)),
        None => Err(ApiError::not_found(format!("no engram {id}"))),
    }
}

pub async fn update_engram(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
    Json(body): Json<UpdateEngramRequest>,
) -> Result<Json<engram_core::model::Engram>, ApiError> {
    let mut engram = state.engine.get_engram(&owner_id, &id).await?.ok_or_else(|| ApiError::not_found(format!("no engram {id}")))?;

    if let Some(content) = body.content {
        engram.content_hash = content_hash(&content);
        engram.content = content;
    }
    if let Some(strand) = body.strand {
        engram.strand = Strand::parse_name(&strand);
    }
    if let Some(tags) = body.tags {
        engram.tags = tags;
    }
    if let Some(metadata) = body.metadata {
        engram.metadata = metadata;
    }
    if let Some(signal) = body.signal {
        engram.set_signal(signal);
    }
    if let Some(pulse_rate) = body.pulse_rate {
        engram.pulse_rate = pulse_rate.clamp(0.0, 1.0);
    }

    let updated = state.engine.update_engram(engram).await?;
    Ok(Json(updated))
}

pub async fn delete_engram(State(state): State<Arc<AppState>>, OwnerId(owner_id): OwnerId, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.engine.delete_engram(&owner_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_engrams(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if body.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }

    let options = SearchOptions {
        limit: body.limit,
        strand: body.strand.as_deref().map(Strand::parse_name),
        min_score: body.min_score,
        min_final_score: body.min_final_score,
        expand_synapses: body.expand_synapses,
    };

    let result = state.engine.search(&owner_id, &body.query, options).await?;
    Ok(Json(result.into()))
}

pub async fn reinforce_engram(
    State(state): State<Arc<AppState>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<String>,
) -> Result<Json<engram_core::model::Engram>, ApiError> {
    match state.engine.reinforce_engram(&owner_id, &id).await? {
        Some(engram) => Ok(Json(engram)),
        None => Err(ApiError::not_found(format!("no engram {id}"))),
    }
}
