//! `engram-core`: the retrieval and memory-graph engine.
//!
//! Four tightly coupled parts: an ingestion pipeline
//! ([`ingest::add_memory`]), a hybrid retrieval pipeline
//! ([`retrieval::search`]), a bitemporal temporal fact store ([`temporal`]),
//! and signal dynamics ([`signal`]). The engine is generic over its three
//! external collaborators — [`store::Store`], [`embed::Embedder`], and
//! [`completion::CompletionProvider`] — injected at construction time, and
//! owns no state beyond them and its read-only [`config::EngineConfig`].

pub mod association;
pub mod bm25;
pub mod completion;
pub mod config;
pub mod dedup;
pub mod embed;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod mathkernel;
pub mod model;
pub mod retrieval;
pub mod signal;
pub mod store;
pub mod tasks;
pub mod temporal;
pub mod tokenizer;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use completion::CompletionProvider;
use config::EngineConfig;
use embed::Embedder;
use error::Result;
use ingest::AddMemoryOptions;
use model::{Chronicle, Engram, Nexus, Strand, Synapse};
use retrieval::{SearchOptions, SearchResult};
use store::{ChronicleFilter, EngineStats, Store};
use tasks::TaskTracker;

/// The engine, generic over its store/embedder/completion-provider
/// collaborators. Construction wires the three traits and the read-only
/// config in one place; every public method is a thin, stateless call into
/// the component modules above — the engine itself owns no state beyond
/// the interface and its constants.
pub struct Engine {
    store: Arc<dyn Store>,
    embedder: Arc<dyn Embedder>,
    completion: Arc<dyn CompletionProvider>,
    config: EngineConfig,
    /// Handle onto detached post-retrieval reinforcement tasks
    /// (fire-and-forget); drained explicitly on graceful shutdown.
    tasks: TaskTracker,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, embedder: Arc<dyn Embedder>, completion: Arc<dyn CompletionProvider>, config: EngineConfig) -> Self {
        Self { store, embedder, completion, config, tasks: TaskTracker::new() }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Awaits every in-flight detached reinforcement task. Call this during
    /// graceful shutdown so cancellation never leaves access counts
    /// partially updated.
    pub async fn drain_background_tasks(&self) {
        self.tasks.drain().await;
    }

    /// `POST /engrams`.
    pub async fn add_memory(&self, owner_id: &str, content: &str, options: AddMemoryOptions) -> Result<Vec<Engram>> {
        ingest::add_memory(self.store.as_ref(), self.embedder.as_ref(), self.completion.as_ref(), &self.config, owner_id, content, options).await
    }

    /// `POST /engrams/search`.
    pub async fn search(&self, owner_id: &str, query: &str, options: SearchOptions) -> Result<SearchResult> {
        retrieval::search(&self.store, self.embedder.as_ref(), &self.config, &self.tasks, owner_id, query, options).await
    }

    /// `GET /engrams/:id`.
    pub async fn get_engram(&self, owner_id: &str, id: &str) -> Result<Option<Engram>> {
        Ok(self.store.get_engram(owner_id, id).await?)
    }

    /// `GET /engrams`.
    pub async fn list_engrams(&self, owner_id: &str, limit: usize, offset: usize, strand: Option<Strand>) -> Result<Vec<Engram>> {
        Ok(self.store.list_engrams(owner_id, limit, offset, strand).await?)
    }

    /// `PATCH /engrams/:id`. Bumps `version`, which strictly increases on
    /// every update.
    pub async fn update_engram(&self, mut engram: Engram) -> Result<Engram> {
        engram.bump_version();
        Ok(self.store.update_engram(engram).await?)
    }

    /// `DELETE /engrams/:id`.
    pub async fn delete_engram(&self, owner_id: &str, id: &str) -> Result<()> {
        Ok(self.store.delete_engram(owner_id, id).await?)
    }

    /// `POST /engrams/:id/reinforce`.
    pub async fn reinforce_engram(&self, owner_id: &str, id: &str) -> Result<Option<Engram>> {
        Ok(self.store.reinforce_engram(owner_id, id, self.config.reinforcement.engram_boost).await?)
    }

    /// `POST /decay/run` — one decay cycle across every strand for
    /// `owner_id`. Returns the total number of engrams whose signal changed.
    pub async fn run_decay(&self, owner_id: &str) -> Result<usize> {
        let mut affected = 0;
        for strand in [
            Strand::Factual,
            Strand::Experiential,
            Strand::Procedural,
            Strand::Preferential,
            Strand::Relational,
            Strand::General,
        ] {
            let rate = self.config.decay.rate_for(strand);
            affected += self.store.decay_engrams(owner_id, strand, rate, self.config.decay.min_signal).await?;
        }
        Ok(affected)
    }

    /// Reinforces every directed synapse along an ordered engram-id path.
    pub async fn reinforce_path(&self, owner_id: &str, path: &[String]) -> Result<()> {
        association::reinforce_path(self.store.as_ref(), owner_id, path, self.config.reinforcement).await
    }

    pub async fn get_synapses_from(&self, owner_id: &str, source_id: &str) -> Result<Vec<Synapse>> {
        Ok(self.store.get_synapses_from(owner_id, source_id).await?)
    }

    /// `POST /chronicles`.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_fact(
        &self,
        owner_id: &str,
        entity: &str,
        attribute: &str,
        value: &str,
        certainty: f32,
        effective_from: Option<DateTime<Utc>>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<Chronicle> {
        temporal::record_fact(self.store.as_ref(), owner_id, entity, attribute, value, certainty, effective_from, metadata).await
    }

    /// `GET /chronicles`.
    pub async fn query_chronicles(&self, owner_id: &str, filter: ChronicleFilter) -> Result<Vec<Chronicle>> {
        temporal::query(self.store.as_ref(), owner_id, filter).await
    }

    /// `GET /chronicles/current`.
    pub async fn current_chronicles(&self, owner_id: &str, entity: Option<&str>) -> Result<Vec<Chronicle>> {
        Ok(self.store.get_current_chronicles(owner_id, entity).await?)
    }

    /// `GET /chronicles/timeline`.
    pub async fn timeline(&self, owner_id: &str, entity: &str) -> Result<Vec<Chronicle>> {
        temporal::timeline(self.store.as_ref(), owner_id, entity).await
    }

    /// `GET /chronicles/:id`.
    pub async fn get_chronicle(&self, owner_id: &str, id: &str) -> Result<Option<Chronicle>> {
        Ok(self.store.get_chronicle(owner_id, id).await?)
    }

    /// `PATCH /chronicles/:id`.
    pub async fn update_chronicle(&self, chronicle: Chronicle) -> Result<Chronicle> {
        Ok(self.store.update_chronicle(chronicle).await?)
    }

    /// `DELETE /chronicles/:id` — soft expiry.
    pub async fn expire_chronicle(&self, owner_id: &str, id: &str) -> Result<()> {
        temporal::expire(self.store.as_ref(), owner_id, id).await
    }

    /// `GET /chronicles/:id/related`.
    pub async fn related_chronicles(&self, owner_id: &str, chronicle_id: &str) -> Result<Vec<Chronicle>> {
        temporal::related(self.store.as_ref(), owner_id, chronicle_id).await
    }

    /// `POST /nexuses`.
    pub async fn link_chronicles(
        &self,
        owner_id: &str,
        origin_id: &str,
        linked_id: &str,
        bond_type: &str,
        strength: f32,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<Nexus> {
        temporal::link(self.store.as_ref(), owner_id, origin_id, linked_id, bond_type, strength, metadata).await
    }

    /// `GET /health`.
    pub async fn health_check(&self) -> Result<()> {
        Ok(self.store.health_check().await?)
    }

    /// `GET /status`.
    pub async fn stats(&self, owner_id: &str) -> Result<EngineStats> {
        Ok(self.store.get_stats(owner_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use completion::NativeCompletionProvider;
    use embed::HashEmbedder;
    use store::memory::MemoryStore;

    fn test_engine() -> Engine {
        Engine::new(Arc::new(MemoryStore::new()), Arc::new(HashEmbedder::new(32)), Arc::new(NativeCompletionProvider), EngineConfig::new(32))
    }

    #[tokio::test]
    async fn add_memory_then_search_round_trips() {
        let engine = test_engine();
        engine.add_memory("u", "I love hiking in the mountains", AddMemoryOptions::default()).await.unwrap();
        let result = engine
            .search("u", "hiking", SearchOptions { min_final_score: Some(0.0), ..Default::default() })
            .await
            .unwrap();
        assert!(!result.hits.is_empty());
    }

    #[tokio::test]
    async fn reinforce_engram_by_boost_clamps_at_one() {
        let engine = test_engine();
        let created = engine.add_memory("u", "a standalone fact", AddMemoryOptions::default()).await.unwrap();
        let id = &created[0].id;
        for _ in 0..20 {
            engine.reinforce_engram("u", id).await.unwrap();
        }
        let reinforced = engine.get_engram("u", id).await.unwrap().unwrap();
        assert_eq!(reinforced.signal, 1.0);
    }

    #[tokio::test]
    async fn run_decay_with_rate_below_one_strictly_decreases_signal() {
        let engine = test_engine();
        let created = engine.add_memory("u", "a decaying fact", AddMemoryOptions::default()).await.unwrap();
        let before = engine.get_engram("u", &created[0].id).await.unwrap().unwrap().signal;
        engine.run_decay("u").await.unwrap();
        let after = engine.get_engram("u", &created[0].id).await.unwrap().unwrap().signal;
        assert!(after < before);
    }

    #[tokio::test]
    async fn record_fact_then_timeline_round_trips() {
        let engine = test_engine();
        engine.record_fact("u", "speaker", "phone", "Samsung", 1.0, None, HashMap::new()).await.unwrap();
        engine.record_fact("u", "speaker", "phone", "iPhone", 1.0, None, HashMap::new()).await.unwrap();
        let tl = engine.timeline("u", "speaker").await.unwrap();
        assert_eq!(tl.len(), 2);
        assert_eq!(tl[1].value, "iPhone");
        assert!(tl[1].effective_until.is_none());
    }
}
