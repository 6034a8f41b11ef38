//! Store contract.
//!
//! A narrow, storage-agnostic capability set covering engrams, synapses,
//! chronicles, and nexuses. Two concrete backends ship with this crate:
//! [`memory::MemoryStore`] (in-process, dependency-free) and, behind the
//! `sqlite-store` feature, [`sqlite::SqliteStore`] (single-file embedded
//! database). Both are first-class, not test doubles — the engine depends
//! only on this trait and is free of backend-specific code.
//!
//! Near-neighbor index construction is explicitly delegated to the backend:
//! `vector_search` may be a sequential scan, IVF, or HNSW, as long as it
//! returns results in descending score order with scores mapped into
//! `[0, 1]`.

pub mod memory;
#[cfg(feature = "sqlite-store")]
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{Chronicle, Engram, Nexus, Strand, Synapse};

pub type Result<T> = std::result::Result<T, StoreError>;

/// A single vector-search hit: the matched engram plus its similarity score,
/// already mapped into `[0, 1]`.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub engram: Engram,
    pub score: f32,
}

/// Filter accepted by [`Store::query_chronicles`]. Any subset of `entity`,
/// `attribute`, `at`, `from`, `to` may be set.
#[derive(Debug, Clone, Default)]
pub struct ChronicleFilter {
    pub entity: Option<String>,
    pub attribute: Option<String>,
    pub at: Option<DateTime<Utc>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Coarse health/statistics snapshot, surfaced through `GET /status`.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    pub engram_count: i64,
    pub synapse_count: i64,
    pub chronicle_count: i64,
    pub nexus_count: i64,
}

/// The persistence driver's capability contract.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<()>;

    // ---- engrams ----
    async fn create_engram(&self, engram: Engram) -> Result<Engram>;
    async fn get_engram(&self, owner_id: &str, id: &str) -> Result<Option<Engram>>;
    async fn update_engram(&self, engram: Engram) -> Result<Engram>;
    async fn delete_engram(&self, owner_id: &str, id: &str) -> Result<()>;
    async fn list_engrams(
        &self,
        owner_id: &str,
        limit: usize,
        offset: usize,
        strand: Option<Strand>,
    ) -> Result<Vec<Engram>>;
    async fn find_by_content_hash(&self, owner_id: &str, content_hash: &str) -> Result<Option<Engram>>;
    async fn vector_search(
        &self,
        owner_id: &str,
        embedding: &[f32],
        limit: usize,
        strand: Option<Strand>,
    ) -> Result<Vec<VectorHit>>;
    async fn reinforce_engram(&self, owner_id: &str, id: &str, boost: f32) -> Result<Option<Engram>>;
    /// Applies one decay cycle to every engram of `owner_id` on `strand`,
    /// returning the number of engrams whose signal changed.
    async fn decay_engrams(&self, owner_id: &str, strand: Strand, rate: f32, min_signal: f32) -> Result<usize>;
    async fn record_access(&self, owner_id: &str, id: &str) -> Result<()>;

    // ---- synapses ----
    async fn create_synapse(&self, owner_id: &str, source_id: &str, target_id: &str, weight: f32) -> Result<Synapse>;
    async fn get_synapses_from(&self, owner_id: &str, source_id: &str) -> Result<Vec<Synapse>>;
    async fn reinforce_synapse(&self, owner_id: &str, source_id: &str, target_id: &str, boost: f32) -> Result<Option<Synapse>>;
    async fn get_synapses_between(&self, owner_id: &str, a: &str, b: &str) -> Result<Vec<Synapse>>;

    // ---- chronicles ----
    async fn create_chronicle(&self, chronicle: Chronicle) -> Result<Chronicle>;
    async fn get_chronicle(&self, owner_id: &str, id: &str) -> Result<Option<Chronicle>>;
    async fn update_chronicle(&self, chronicle: Chronicle) -> Result<Chronicle>;
    /// Soft delete: sets `effective_until = now` iff the chronicle is
    /// currently open; a no-op otherwise.
    async fn delete_chronicle(&self, owner_id: &str, id: &str) -> Result<()>;
    async fn query_chronicles(&self, owner_id: &str, filter: ChronicleFilter) -> Result<Vec<Chronicle>>;
    async fn get_current_chronicle(&self, owner_id: &str, entity: &str, attribute: &str) -> Result<Option<Chronicle>>;
    async fn get_current_chronicles(&self, owner_id: &str, entity: Option<&str>) -> Result<Vec<Chronicle>>;
    async fn get_timeline(&self, owner_id: &str, entity: &str) -> Result<Vec<Chronicle>>;

    // ---- nexuses ----
    async fn create_nexus(&self, nexus: Nexus) -> Result<Nexus>;
    async fn get_related_chronicles(&self, owner_id: &str, chronicle_id: &str) -> Result<Vec<Chronicle>>;

    // ---- misc ----
    async fn get_stats(&self, owner_id: &str) -> Result<EngineStats>;
}
