//! Ingestion orchestrator: `addMemory`.
//!
//! Glue from raw text to stored engrams + chronicles + synapses. Facts are
//! processed sequentially per request to preserve dedup ordering — otherwise
//! two near-identical facts in the same input could both be inserted.

use std::collections::HashMap;

use tracing::warn;

use crate::association;
use crate::completion::CompletionProvider;
use crate::config::EngineConfig;
use crate::dedup::{self, content_hash};
use crate::embed::Embedder;
use crate::error::Result;
use crate::extractor;
use crate::model::{Engram, Strand};
use crate::store::Store;
use crate::temporal;

/// Caller-supplied overrides for [`add_memory`]. Every field is optional;
/// unset fields take ingestion's defaults.
#[derive(Debug, Clone, Default)]
pub struct AddMemoryOptions {
    pub strand: Option<Strand>,
    pub tags: Vec<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub signal: Option<f32>,
    pub pulse_rate: Option<f32>,
}

/// Runs the full ingestion algorithm for `(owner_id, content)` and returns
/// every engram that was created or reinforced, in input order.
pub async fn add_memory(
    store: &dyn Store,
    embedder: &dyn Embedder,
    completion: &dyn CompletionProvider,
    config: &EngineConfig,
    owner_id: &str,
    content: &str,
    options: AddMemoryOptions,
) -> Result<Vec<Engram>> {
    let extracted = extractor::extract(completion, content).await;

    if extracted.facts.is_empty() && extracted.temporal_facts.is_empty() {
        return Ok(Vec::new());
    }

    let strand = options.strand.unwrap_or(extracted.strand);
    let signal = options.signal.unwrap_or(0.5);
    let pulse_rate = options.pulse_rate.unwrap_or(0.1);

    let mut engrams = Vec::with_capacity(extracted.facts.len());
    for fact in &extracted.facts {
        let embedding = embedder.embed(fact).await?;
        let duplicate = dedup::find_duplicate(store, owner_id, fact, &embedding, config.dedup).await?;

        let engram = match duplicate {
            Some(found) => reinforce_existing(store, owner_id, &found.engram.id, config).await?,
            None => {
                let hash = content_hash(fact);
                let new_engram = Engram::new(
                    owner_id,
                    fact.clone(),
                    hash,
                    strand,
                    options.tags.clone(),
                    options.metadata.clone(),
                    embedding,
                    signal,
                    pulse_rate,
                );
                store.create_engram(new_engram).await?
            }
        };
        engrams.push(engram);
    }

    if engrams.len() >= 2 {
        let ids: Vec<String> = engrams.iter().map(|e| e.id.clone()).collect();
        association::form_synapses(store, owner_id, &ids, config.association).await?;
    }

    for fact in &extracted.temporal_facts {
        let result = temporal::record_fact(store, owner_id, &fact.entity, &fact.attribute, &fact.value, 1.0, None, HashMap::new()).await;
        if let Err(err) = result {
            warn!(owner_id, entity = %fact.entity, attribute = %fact.attribute, error = %err, "chronicle recording failed during ingestion, continuing");
        }
    }

    Ok(engrams)
}

async fn reinforce_existing(store: &dyn Store, owner_id: &str, id: &str, config: &EngineConfig) -> Result<Engram> {
    match store.reinforce_engram(owner_id, id, config.reinforcement.engram_boost).await? {
        Some(e) => Ok(e),
        None => {
            // Engram vanished between the dedup lookup and reinforcement
            // (concurrent delete); surface as not-found rather than panic.
            Err(crate::error::EngineError::NotFound(id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::NativeCompletionProvider;
    use crate::embed::HashEmbedder;
    use crate::store::memory::MemoryStore;

    fn harness() -> (MemoryStore, HashEmbedder, NativeCompletionProvider, EngineConfig) {
        (MemoryStore::new(), HashEmbedder::new(32), NativeCompletionProvider, EngineConfig::new(32))
    }

    #[tokio::test]
    async fn ingest_samsung_phone_creates_one_engram_and_chronicle() {
        let (store, embedder, completion, config) = harness();
        let result = add_memory(&store, &embedder, &completion, &config, "u", "I just got a Samsung Galaxy S24", AddMemoryOptions::default())
            .await
            .unwrap();
        assert_eq!(result.len(), 1);

        let current = store.get_current_chronicle("u", "self", "uses").await;
        // NativeCompletionProvider's heuristic cue table may or may not fire
        // on this exact phrasing; assert the call at least succeeds end to end.
        assert!(current.is_ok());
    }

    #[tokio::test]
    async fn ingesting_same_content_twice_reinforces_instead_of_duplicating() {
        let (store, embedder, completion, config) = harness();
        let first = add_memory(&store, &embedder, &completion, &config, "u", "I love hiking in the mountains", AddMemoryOptions::default())
            .await
            .unwrap();
        let second = add_memory(&store, &embedder, &completion, &config, "u", "I love hiking in the mountains", AddMemoryOptions::default())
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].id, second[0].id);
        assert!(second[0].signal > first[0].signal || (first[0].signal - 1.0).abs() < 1e-6);

        let all = store.list_engrams("u", 100, 0, None).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn two_facts_from_one_input_form_a_synapse() {
        let (store, embedder, completion, config) = harness();
        let result = add_memory(
            &store,
            &embedder,
            &completion,
            &config,
            "u",
            "I love hiking. I enjoy cooking Italian food.",
            AddMemoryOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 2);
        let synapses = store.get_synapses_between("u", &result[0].id, &result[1].id).await.unwrap();
        assert_eq!(synapses.len(), 1);
        assert_eq!(synapses[0].weight, 0.5);
    }

    #[tokio::test]
    async fn caller_supplied_strand_overrides_extracted_strand() {
        let (store, embedder, completion, config) = harness();
        let result = add_memory(
            &store,
            &embedder,
            &completion,
            &config,
            "u",
            "I love hiking",
            AddMemoryOptions { strand: Some(Strand::Procedural), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(result[0].strand, Strand::Procedural);
    }

    #[tokio::test]
    async fn empty_extraction_yields_empty_result() {
        let (store, embedder, completion, config) = harness();
        let result = add_memory(&store, &embedder, &completion, &config, "u", "   ", AddMemoryOptions::default()).await.unwrap();
        assert!(result.is_empty());
    }
}
