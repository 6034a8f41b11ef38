//! Request/response bodies for the REST surface. camelCase wire format
//! throughout, matching [`engram_core::model`]'s own
//! `#[serde(rename_all = "camelCase")]` types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use engram_core::model::{Chronicle, Engram, Nexus};
use engram_core::retrieval::SearchResult;
use engram_core::store::EngineStats;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEngramRequest {
    pub content: String,
    pub strand: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub signal: Option<f32>,
    pub pulse_rate: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct CreateEngramResponse {
    pub engrams: Vec<Engram>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEngramsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub strand: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EngramListResponse {
    pub engrams: Vec<Engram>,
}

/// `PATCH /engrams/:id` — only the fields a caller sends are applied.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEngramRequest {
    pub content: Option<String>,
    pub strand: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<HashMap<String, Value>>,
    pub signal: Option<f32>,
    pub pulse_rate: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
    pub strand: Option<String>,
    pub min_score: Option<f32>,
    pub min_final_score: Option<f32>,
    pub expand_synapses: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTraceDto {
    pub vector_score: f32,
    pub keyword_score: f32,
    pub recency_boost: f32,
    pub signal_boost: f32,
    pub synapse_boost: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHitDto {
    pub engram: Engram,
    pub final_score: f32,
    pub trace: ScoreTraceDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChronicleMatchDto {
    pub chronicle: Chronicle,
    pub relevance: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<SearchHitDto>,
    pub chronicle_matches: Vec<ChronicleMatchDto>,
    pub total: usize,
    pub query: String,
    pub elapsed_ms: u64,
}

impl From<SearchResult> for SearchResponse {
    fn from(result: SearchResult) -> Self {
        Self {
            hits: result
                .hits
                .into_iter()
                .map(|h| SearchHitDto {
                    engram: h.engram,
                    final_score: h.final_score,
                    trace: ScoreTraceDto {
                        vector_score: h.trace.vector_score,
                        keyword_score: h.trace.keyword_score,
                        recency_boost: h.trace.recency_boost,
                        signal_boost: h.trace.signal_boost,
                        synapse_boost: h.trace.synapse_boost,
                    },
                })
                .collect(),
            chronicle_matches: result
                .chronicle_matches
                .into_iter()
                .map(|m| ChronicleMatchDto { chronicle: m.chronicle, relevance: m.relevance })
                .collect(),
            total: result.total,
            query: result.query,
            elapsed_ms: result.elapsed_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFactRequest {
    pub entity: String,
    pub attribute: String,
    pub value: String,
    pub certainty: Option<f32>,
    pub effective_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChronicleQuery {
    pub entity: Option<String>,
    pub attribute: Option<String>,
    pub at: Option<DateTime<Utc>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ChronicleListResponse {
    pub chronicles: Vec<Chronicle>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChronicleRequest {
    pub value: Option<String>,
    pub certainty: Option<f32>,
    pub effective_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentChroniclesQuery {
    pub entity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineQuery {
    pub entity: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkChroniclesRequest {
    pub origin_id: String,
    pub linked_id: String,
    pub bond_type: String,
    pub strength: Option<f32>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub engram_count: i64,
    pub synapse_count: i64,
    pub chronicle_count: i64,
    pub nexus_count: i64,
}

impl From<EngineStats> for StatsResponse {
    fn from(stats: EngineStats) -> Self {
        Self {
            engram_count: stats.engram_count,
            synapse_count: stats.synapse_count,
            chronicle_count: stats.chronicle_count,
            nexus_count: stats.nexus_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayRunResponse {
    pub affected: usize,
}

#[derive(Debug, Serialize)]
pub struct NexusResponse {
    pub nexus: Nexus,
}
