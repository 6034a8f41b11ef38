//! Engine-wide tunables.
//!
//! One small `Default`-able struct per component, read-only after
//! construction.

use crate::model::Strand;

/// BM25 parameters. Applied only to the vector-retrieved shortlist, never
/// corpus-wide.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Config {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Reinforcement boosts.
#[derive(Debug, Clone, Copy)]
pub struct ReinforcementConfig {
    pub engram_boost: f32,
    pub synapse_boost: f32,
}

impl Default for ReinforcementConfig {
    fn default() -> Self {
        Self {
            engram_boost: 0.1,
            synapse_boost: 0.05,
        }
    }
}

/// Per-strand multiplicative decay rates and the signal floor.
#[derive(Debug, Clone, Copy)]
pub struct DecayConfig {
    pub factual: f32,
    pub experiential: f32,
    pub procedural: f32,
    pub preferential: f32,
    pub relational: f32,
    pub general: f32,
    pub min_signal: f32,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            factual: 0.95,
            experiential: 0.90,
            procedural: 0.97,
            preferential: 0.93,
            relational: 0.92,
            general: 0.88,
            min_signal: 0.01,
        }
    }
}

impl DecayConfig {
    pub fn rate_for(&self, strand: Strand) -> f32 {
        match strand {
            Strand::Factual => self.factual,
            Strand::Experiential => self.experiential,
            Strand::Procedural => self.procedural,
            Strand::Preferential => self.preferential,
            Strand::Relational => self.relational,
            Strand::General => self.general,
        }
    }
}

/// Deduplicator thresholds.
#[derive(Debug, Clone, Copy)]
pub struct DedupConfig {
    pub semantic_neighbors: usize,
    pub semantic_threshold: f32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            semantic_neighbors: 5,
            semantic_threshold: 0.92,
        }
    }
}

/// Association engine BFS defaults.
#[derive(Debug, Clone, Copy)]
pub struct AssociationConfig {
    pub formation_weight: f32,
    pub formation_boost: f32,
    pub max_depth: usize,
    pub decay_factor: f32,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            formation_weight: 0.5,
            formation_boost: 0.5,
            max_depth: 2,
            decay_factor: 0.8,
        }
    }
}

/// Fusion weights and retrieval defaults. The five components
/// (vector/keyword/recency/signal/synapse) sum to `1.00`.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalConfig {
    pub vector_weight: f32,
    pub keyword_weight: f32,
    pub recency_weight: f32,
    pub signal_weight: f32,
    pub synapse_weight: f32,
    pub default_limit: usize,
    pub default_min_score: f32,
    pub default_min_final_score: f32,
    pub candidate_multiplier: usize,
    pub expand_seed_count: usize,
    pub chronicle_match_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_weight: 0.30,
            keyword_weight: 0.30,
            recency_weight: 0.10,
            signal_weight: 0.15,
            synapse_weight: 0.15,
            default_limit: 10,
            default_min_score: 0.0,
            default_min_final_score: 0.35,
            candidate_multiplier: 3,
            expand_seed_count: 5,
            chronicle_match_limit: 5,
        }
    }
}

/// Top-level engine configuration: one field per component config, plus the
/// fixed embedding dimension `D` engrams in this store share.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub dimensions: usize,
    pub bm25: Bm25Config,
    pub reinforcement: ReinforcementConfig,
    pub decay: DecayConfig,
    pub dedup: DedupConfig,
    pub association: AssociationConfig,
    pub retrieval: RetrievalConfig,
}

impl EngineConfig {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            bm25: Bm25Config::default(),
            reinforcement: ReinforcementConfig::default(),
            decay: DecayConfig::default(),
            dedup: DedupConfig::default(),
            association: AssociationConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}
