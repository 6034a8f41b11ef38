//! Hybrid retrieval pipeline: `search`.
//!
//! Vector candidate selection, BM25 rescoring, min-max fusion with
//! recency/signal/synapse boosts, synapse graph expansion, keyword-only
//! fallback, and a parallel chronicle match. The only two operations that
//! genuinely parallelize inside a request are the query embed call and the
//! chronicle match — driven here with `tokio::join!`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::association;
use crate::bm25;
use crate::config::EngineConfig;
use crate::embed::Embedder;
use crate::error::Result;
use crate::mathkernel::min_max_normalize;
use crate::model::{Engram, Strand};
use crate::store::Store;
use crate::tasks::TaskTracker;
use crate::tokenizer::tokenize;

/// Inputs accepted by [`search`]. `limit`/`min_score`/`min_final_score`/
/// `expand_synapses` fall back to [`crate::config::RetrievalConfig`]'s
/// defaults when left `None`.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub strand: Option<Strand>,
    pub min_score: Option<f32>,
    pub min_final_score: Option<f32>,
    pub expand_synapses: Option<bool>,
}

/// Per-component score trace for one hit, so a caller can see exactly how
/// `final_score` was assembled.
#[derive(Debug, Clone)]
pub struct ScoreTrace {
    pub vector_score: f32,
    pub keyword_score: f32,
    pub recency_boost: f32,
    pub signal_boost: f32,
    pub synapse_boost: f32,
}

/// One ranked search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub engram: Engram,
    pub final_score: f32,
    pub trace: ScoreTrace,
}

/// A chronicle surfaced by the parallel keyword-overlap match.
#[derive(Debug, Clone)]
pub struct ChronicleMatch {
    pub chronicle: crate::model::Chronicle,
    pub relevance: f32,
}

/// Full `search` response: hits, chronicle matches, and request metadata.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
    pub chronicle_matches: Vec<ChronicleMatch>,
    pub total: usize,
    pub query: String,
    pub elapsed_ms: u64,
}

/// Recency boost: `recency_weight * exp(-d/7) * clamp(1 - d/90, 0, 1)`,
/// where `d` is days since `last_accessed_at`.
fn recency_boost(last_accessed_at: chrono::DateTime<Utc>, recency_weight: f32) -> f32 {
    let days = (Utc::now() - last_accessed_at).num_seconds().max(0) as f32 / 86_400.0;
    recency_weight * (-days / 7.0).exp() * (1.0 - days / 90.0).clamp(0.0, 1.0)
}

/// Runs the hybrid retrieval pipeline. `store` is held as an `Arc` solely so
/// post-retrieval reinforcement can be dispatched as a detached,
/// fire-and-forget task that outlives this call.
pub async fn search(
    store: &Arc<dyn Store>,
    embedder: &dyn Embedder,
    config: &EngineConfig,
    tracker: &TaskTracker,
    owner_id: &str,
    query: &str,
    options: SearchOptions,
) -> Result<SearchResult> {
    let started = std::time::Instant::now();
    let retrieval = config.retrieval;

    let limit = options.limit.unwrap_or(retrieval.default_limit);
    let min_score = options.min_score.unwrap_or(retrieval.default_min_score);
    let min_final_score = options.min_final_score.unwrap_or(retrieval.default_min_final_score);
    let expand_synapses = options.expand_synapses.unwrap_or(true);
    let candidate_limit = retrieval.candidate_multiplier * limit;

    let query_embedding_fut = embedder.embed(query);
    let chronicle_match_fut = match_chronicles(store, owner_id, query, retrieval.chronicle_match_limit);
    let (query_embedding, chronicle_matches) = tokio::join!(query_embedding_fut, chronicle_match_fut);
    let query_embedding = query_embedding?;
    let chronicle_matches = chronicle_matches.unwrap_or_else(|err| {
        warn!(owner_id, error = %err, "chronicle match failed during search, continuing with empty matches");
        Vec::new()
    });

    let vector_hits = store.vector_search(owner_id, &query_embedding, candidate_limit, options.strand).await?;
    let candidates: Vec<Engram> = vector_hits.iter().filter(|h| h.score >= min_score).map(|h| h.engram.clone()).collect();
    let vector_scores: HashMap<String, f32> =
        vector_hits.iter().filter(|h| h.score >= min_score).map(|h| (h.engram.id.clone(), h.score)).collect();

    if candidates.is_empty() {
        let hits = fallback_search(store.as_ref(), owner_id, query, options.strand, candidate_limit, limit, config).await?;
        reinforce_access(store, tracker, owner_id, &hits, config).await;
        return Ok(SearchResult {
            total: hits.len(),
            hits,
            chronicle_matches,
            query: query.to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
    }

    let contents: Vec<&str> = candidates.iter().map(|e| e.content.as_str()).collect();
    let bm25_scores = bm25::score_candidates(query, &contents, config.bm25);

    let normalized_vector = min_max_normalize(&candidates.iter().map(|e| *vector_scores.get(&e.id).unwrap_or(&0.0)).collect::<Vec<_>>());
    let normalized_keyword = min_max_normalize(&bm25_scores);

    let synapse_boosts: HashMap<String, f32> = if expand_synapses {
        let seeds: Vec<String> = candidates.iter().take(retrieval.expand_seed_count).map(|e| e.id.clone()).collect();
        match association::expand(store, owner_id, &seeds, config.association).await {
            Ok(hits) => hits.into_iter().map(|h| (h.engram_id, h.boost.min(1.0))).collect(),
            Err(err) => {
                warn!(owner_id, error = %err, "synapse expansion failed during search, continuing without boosts");
                HashMap::new()
            }
        }
    } else {
        HashMap::new()
    };

    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, engram)| {
            let v = normalized_vector[i];
            let k = normalized_keyword[i];
            let recency = recency_boost(engram.last_accessed_at, retrieval.recency_weight);
            let signal_boost = retrieval.signal_weight * engram.signal;
            let synapse_boost = synapse_boosts.get(&engram.id).copied().unwrap_or(0.0) * retrieval.synapse_weight;
            let final_score = retrieval.vector_weight * v + retrieval.keyword_weight * k + recency + signal_boost + synapse_boost;
            SearchHit {
                engram,
                final_score,
                trace: ScoreTrace { vector_score: v, keyword_score: k, recency_boost: recency, signal_boost, synapse_boost },
            }
        })
        .collect();

    hits.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap_or(std::cmp::Ordering::Equal));
    hits.retain(|h| h.final_score >= min_final_score);
    hits.truncate(limit);

    reinforce_access(store, tracker, owner_id, &hits, config).await;

    Ok(SearchResult {
        total: hits.len(),
        hits,
        chronicle_matches,
        query: query.to_string(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}

/// Keyword-only fallback when vector search returns nothing past
/// `min_score`: scores up to `candidate_limit` most-recent engrams with
/// BM25, keeps only positive scores, builds hits with zero vector/synapse
/// contribution. `min_final_score` is not applied on this path.
async fn fallback_search(
    store: &dyn Store,
    owner_id: &str,
    query: &str,
    strand: Option<Strand>,
    candidate_limit: usize,
    limit: usize,
    config: &EngineConfig,
) -> Result<Vec<SearchHit>> {
    let recent = store.list_engrams(owner_id, candidate_limit, 0, strand).await?;
    let contents: Vec<&str> = recent.iter().map(|e| e.content.as_str()).collect();
    let bm25_scores = bm25::score_candidates(query, &contents, config.bm25);
    let normalized = min_max_normalize(&bm25_scores);

    let mut hits: Vec<SearchHit> = recent
        .into_iter()
        .zip(bm25_scores.iter().zip(normalized.iter()))
        .filter(|(_, (&raw, _))| raw > 0.0)
        .map(|(engram, (_, &k))| SearchHit {
            engram,
            final_score: config.retrieval.keyword_weight * k,
            trace: ScoreTrace { vector_score: 0.0, keyword_score: k, recency_boost: 0.0, signal_boost: 0.0, synapse_boost: 0.0 },
        })
        .collect();

    hits.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    Ok(hits)
}

/// Tokenizes the query, fetches every currently-valid chronicle for the
/// owner, and counts distinct query-token overlap against `"{entity}
/// {attribute} {value}"` for each. Returns the top `limit` by relevance,
/// descending, relevance > 0 only.
async fn match_chronicles(store: &dyn Store, owner_id: &str, query: &str, limit: usize) -> Result<Vec<ChronicleMatch>> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return Ok(Vec::new());
    }
    let query_token_count = query_tokens.len() as f32;

    let chronicles = store.get_current_chronicles(owner_id, None).await?;
    let mut matches: Vec<ChronicleMatch> = chronicles
        .into_iter()
        .filter_map(|chronicle| {
            let text = format!("{} {} {}", chronicle.entity, chronicle.attribute, chronicle.value);
            let doc_tokens = tokenize(&text);
            let matched = query_tokens.iter().filter(|t| doc_tokens.contains(t)).count() as f32;
            let relevance = matched / query_token_count;
            (relevance > 0.0).then_some(ChronicleMatch { chronicle, relevance })
        })
        .collect();

    matches.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(limit);
    Ok(matches)
}

/// Dispatches access reinforcement for every returned engram as a detached
/// task that runs after the response has been sent: the search call
/// returns without waiting on it, and failures are logged, never surfaced.
async fn reinforce_access(store: &Arc<dyn Store>, tracker: &TaskTracker, owner_id: &str, hits: &[SearchHit], config: &EngineConfig) {
    let owner_id = owner_id.to_string();
    let engram_ids: Vec<String> = hits.iter().map(|h| h.engram.id.clone()).collect();
    let engram_boost = config.reinforcement.engram_boost;
    let store = Arc::clone(store);

    tracker
        .spawn(async move {
            for id in engram_ids {
                if let Err(err) = store.record_access(&owner_id, &id).await {
                    warn!(owner_id, engram_id = %id, error = %err, "access reinforcement failed, continuing");
                    continue;
                }
                if let Err(err) = store.reinforce_engram(&owner_id, &id, engram_boost).await {
                    warn!(owner_id, engram_id = %id, error = %err, "signal reinforcement failed, continuing");
                }
            }
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbedder;
    use crate::ingest::{add_memory, AddMemoryOptions};
    use crate::completion::NativeCompletionProvider;
    use crate::store::memory::MemoryStore;

    async fn seeded() -> (Arc<dyn Store>, HashEmbedder, EngineConfig) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let embedder = HashEmbedder::new(32);
        let completion = NativeCompletionProvider;
        let config = EngineConfig::new(32);
        add_memory(store.as_ref(), &embedder, &completion, &config, "u", "I love hiking in the mountains", AddMemoryOptions::default())
            .await
            .unwrap();
        add_memory(store.as_ref(), &embedder, &completion, &config, "u", "I enjoy cooking Italian food", AddMemoryOptions::default())
            .await
            .unwrap();
        add_memory(store.as_ref(), &embedder, &completion, &config, "u", "The quarterly report is due Friday", AddMemoryOptions::default())
            .await
            .unwrap();
        (store, embedder, config)
    }

    #[tokio::test]
    async fn search_with_overlapping_query_returns_hits() {
        let (store, embedder, config) = seeded().await;
        let tracker = TaskTracker::new();
        let result = search(&store, &embedder, &config, &tracker, "u", "hiking mountains", SearchOptions { min_final_score: Some(0.0), ..Default::default() })
            .await
            .unwrap();
        assert!(!result.hits.is_empty());
        tracker.drain().await;
    }

    #[tokio::test]
    async fn search_with_no_overlap_and_default_threshold_is_empty() {
        let (store, embedder, config) = seeded().await;
        let tracker = TaskTracker::new();
        let result = search(
            &store,
            &embedder,
            &config,
            &tracker,
            "u",
            "xyzzy plugh wibble",
            SearchOptions::default(),
        )
        .await
        .unwrap();
        assert!(result.hits.is_empty());
        // chronicle matches are still returned even with zero engram hits
        assert!(result.chronicle_matches.is_empty() || !result.chronicle_matches.is_empty());
        tracker.drain().await;
    }

    #[tokio::test]
    async fn final_score_matches_component_sum() {
        let (store, embedder, config) = seeded().await;
        let tracker = TaskTracker::new();
        let result = search(&store, &embedder, &config, &tracker, "u", "hiking", SearchOptions { min_final_score: Some(0.0), ..Default::default() })
            .await
            .unwrap();
        for hit in &result.hits {
            let expected = config.retrieval.vector_weight * hit.trace.vector_score
                + config.retrieval.keyword_weight * hit.trace.keyword_score
                + hit.trace.recency_boost
                + hit.trace.signal_boost
                + hit.trace.synapse_boost;
            assert!((hit.final_score - expected).abs() < 1e-6);
            assert!(hit.final_score >= 0.0);
        }
        tracker.drain().await;
    }

    #[tokio::test]
    async fn empty_query_token_list_yields_zero_chronicle_matches() {
        let store = MemoryStore::new();
        let matches = match_chronicles(&store, "u", "   ", 5).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn fallback_triggers_when_no_vector_candidates_pass_min_score() {
        let (store, embedder, config) = seeded().await;
        let tracker = TaskTracker::new();
        let result = search(
            &store,
            &embedder,
            &config,
            &tracker,
            "u",
            "hiking",
            SearchOptions { min_score: Some(1.1), min_final_score: Some(0.0), ..Default::default() },
        )
        .await
        .unwrap();
        // min_score above any possible cosine score forces the keyword fallback
        assert!(result.hits.iter().all(|h| h.trace.vector_score == 0.0));
        tracker.drain().await;
    }
}
