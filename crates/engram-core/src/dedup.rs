//! Deduplicator.
//!
//! Two-stage check against existing engrams of the same owner: an exact
//! SHA-256 content hash match, then a semantic check against the top-5
//! vector neighbors. A duplicate never creates a new engram — ingestion
//! reinforces the existing one instead.

use sha2::{Digest, Sha256};

use crate::config::DedupConfig;
use crate::error::Result;
use crate::mathkernel::cosine_similarity;
use crate::model::Engram;
use crate::store::Store;

/// SHA-256 hex digest of `content`, stable per owner.
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("{digest:x}")
}

/// The result of a duplicate check: the matched engram plus the similarity
/// that triggered the match (`1.0` for an exact hash hit).
pub struct DuplicateMatch {
    pub engram: Engram,
    pub similarity: f32,
}

/// Checks `owner_id`'s existing engrams for a duplicate of `content`/`embedding`.
///
/// Exact hash match wins outright. Otherwise the top `semantic_neighbors`
/// vector neighbors are compared by full cosine similarity against
/// `embedding`; the first one at or above `semantic_threshold` wins.
pub async fn find_duplicate(
    store: &dyn Store,
    owner_id: &str,
    content: &str,
    embedding: &[f32],
    config: DedupConfig,
) -> Result<Option<DuplicateMatch>> {
    let hash = content_hash(content);
    if let Some(engram) = store.find_by_content_hash(owner_id, &hash).await? {
        return Ok(Some(DuplicateMatch { engram, similarity: 1.0 }));
    }

    let neighbors = store
        .vector_search(owner_id, embedding, config.semantic_neighbors, None)
        .await?;
    for hit in neighbors {
        let similarity = cosine_similarity(&hit.engram.embedding, embedding);
        if similarity >= config.semantic_threshold {
            return Ok(Some(DuplicateMatch { engram: hit.engram, similarity }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Strand;
    use crate::store::memory::MemoryStore;
    use std::collections::HashMap;

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash("hello"), content_hash("hello"));
        assert_ne!(content_hash("hello"), content_hash("world"));
    }

    #[tokio::test]
    async fn exact_hash_match_wins_with_similarity_one() {
        let store = MemoryStore::new();
        let hash = content_hash("I love hiking");
        let e = Engram::new("o", "I love hiking", hash, Strand::General, vec![], HashMap::new(), vec![1.0, 0.0], 0.5, 0.1);
        store.create_engram(e).await.unwrap();

        let found = find_duplicate(&store, "o", "I love hiking", &[0.0, 1.0], DedupConfig::default())
            .await
            .unwrap();
        let found = found.expect("expected duplicate");
        assert_eq!(found.similarity, 1.0);
    }

    #[tokio::test]
    async fn semantic_match_above_threshold() {
        let store = MemoryStore::new();
        let e = Engram::new("o", "Samsung Galaxy S24", content_hash("Samsung Galaxy S24"), Strand::General, vec![], HashMap::new(), vec![1.0, 0.0], 0.5, 0.1);
        store.create_engram(e).await.unwrap();

        let found = find_duplicate(&store, "o", "different text entirely", &[0.999, 0.0447], DedupConfig::default())
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn no_match_below_threshold_returns_none() {
        let store = MemoryStore::new();
        let e = Engram::new("o", "Samsung Galaxy S24", content_hash("Samsung Galaxy S24"), Strand::General, vec![], HashMap::new(), vec![1.0, 0.0], 0.5, 0.1);
        store.create_engram(e).await.unwrap();

        let found = find_duplicate(&store, "o", "completely unrelated", &[0.0, 1.0], DedupConfig::default())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
