//! Engram — the atomic memory unit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse class tag driving decay rate (see [`crate::signal`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strand {
    #[default]
    Factual,
    Experiential,
    Procedural,
    Preferential,
    Relational,
    General,
}

impl Strand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Factual => "factual",
            Strand::Experiential => "experiential",
            Strand::Procedural => "procedural",
            Strand::Preferential => "preferential",
            Strand::Relational => "relational",
            Strand::General => "general",
        }
    }

    /// Parses a strand name, falling back to `general` for anything unknown
    /// (mirrors the fact extractor's own unknown-strand fallback).
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "factual" => Strand::Factual,
            "experiential" => Strand::Experiential,
            "procedural" => Strand::Procedural,
            "preferential" => Strand::Preferential,
            "relational" => Strand::Relational,
            _ => Strand::General,
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An atomic memory unit belonging to a single owner.
///
/// `(owner_id, content_hash)` is effectively unique: ingestion dedups on it
/// (see [`crate::dedup`]). `signal` is clamped to `[0, 1]` at every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engram {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    pub content_hash: String,
    pub strand: Strand,
    pub tags: Vec<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub embedding: Vec<f32>,
    pub signal: f32,
    pub pulse_rate: f32,
    pub access_count: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl Engram {
    /// Builds a fresh engram with the defaults ingestion uses: `signal =
    /// 0.5`, `pulse_rate = 0.1`, `access_count = 0`, `version = 1`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: impl Into<String>,
        content: impl Into<String>,
        content_hash: impl Into<String>,
        strand: Strand,
        tags: Vec<String>,
        metadata: HashMap<String, serde_json::Value>,
        embedding: Vec<f32>,
        signal: f32,
        pulse_rate: f32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            content: content.into(),
            content_hash: content_hash.into(),
            strand,
            tags,
            metadata,
            embedding,
            signal: signal.clamp(0.0, 1.0),
            pulse_rate: pulse_rate.clamp(0.0, 1.0),
            access_count: 0,
            version: 1,
            created_at: now,
            updated_at: now,
            last_accessed_at: now,
        }
    }

    /// Clamps `signal` into `[0, 1]`. Every write path routes through this.
    pub fn set_signal(&mut self, signal: f32) {
        self.signal = signal.clamp(0.0, 1.0);
    }

    /// Bumps `access_count`/`last_accessed_at` without touching `signal`.
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = Utc::now();
    }

    /// Strictly increases `version` and refreshes `updated_at`.
    pub fn bump_version(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_roundtrip() {
        for s in [
            Strand::Factual,
            Strand::Experiential,
            Strand::Procedural,
            Strand::Preferential,
            Strand::Relational,
            Strand::General,
        ] {
            assert_eq!(Strand::parse_name(s.as_str()), s);
        }
    }

    #[test]
    fn unknown_strand_falls_back_to_general() {
        assert_eq!(Strand::parse_name("bogus"), Strand::General);
    }

    #[test]
    fn new_engram_clamps_defaults() {
        let e = Engram::new(
            "owner",
            "content",
            "hash",
            Strand::Factual,
            vec![],
            HashMap::new(),
            vec![0.0; 4],
            1.5,
            -0.2,
        );
        assert_eq!(e.signal, 1.0);
        assert_eq!(e.pulse_rate, 0.0);
        assert_eq!(e.version, 1);
        assert_eq!(e.access_count, 0);
    }

    #[test]
    fn record_access_does_not_touch_signal() {
        let mut e = Engram::new(
            "owner",
            "c",
            "h",
            Strand::General,
            vec![],
            HashMap::new(),
            vec![],
            0.5,
            0.1,
        );
        let signal_before = e.signal;
        e.record_access();
        assert_eq!(e.access_count, 1);
        assert_eq!(e.signal, signal_before);
    }
}
