//! In-process `Store` implementation.
//!
//! Dependency-free and synchronous under the hood, guarded by a single
//! `std::sync::Mutex` over plain `Vec`s — fine for local development and
//! unit tests. A first-class backend in its own right, not a mock. Not
//! persisted across process restarts.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StoreError;
use crate::mathkernel::cosine_to_unit_score;
use crate::model::{Chronicle, Engram, Nexus, Strand, Synapse};

use super::{ChronicleFilter, EngineStats, Result, Store, VectorHit};

#[derive(Default)]
struct Tables {
    engrams: Vec<Engram>,
    synapses: Vec<Synapse>,
    chronicles: Vec<Chronicle>,
    nexuses: Vec<Nexus>,
}

/// In-memory reference implementation of [`Store`].
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }
}

fn lock_err() -> StoreError {
    StoreError::Backend("memory store mutex poisoned".to_string())
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn create_engram(&self, engram: Engram) -> Result<Engram> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        t.engrams.push(engram.clone());
        Ok(engram)
    }

    async fn get_engram(&self, owner_id: &str, id: &str) -> Result<Option<Engram>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        Ok(t.engrams.iter().find(|e| e.owner_id == owner_id && e.id == id).cloned())
    }

    async fn update_engram(&self, engram: Engram) -> Result<Engram> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        let slot = t
            .engrams
            .iter_mut()
            .find(|e| e.owner_id == engram.owner_id && e.id == engram.id)
            .ok_or_else(|| StoreError::NotFound(engram.id.clone()))?;
        *slot = engram.clone();
        Ok(engram)
    }

    async fn delete_engram(&self, owner_id: &str, id: &str) -> Result<()> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        t.engrams.retain(|e| !(e.owner_id == owner_id && e.id == id));
        // cascade delete synapses touching the deleted engram
        t.synapses.retain(|s| !(s.owner_id == owner_id && (s.source_id == id || s.target_id == id)));
        Ok(())
    }

    async fn list_engrams(
        &self,
        owner_id: &str,
        limit: usize,
        offset: usize,
        strand: Option<Strand>,
    ) -> Result<Vec<Engram>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        let mut matches: Vec<Engram> = t
            .engrams
            .iter()
            .filter(|e| e.owner_id == owner_id && strand.is_none_or(|s| e.strand == s))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_by_content_hash(&self, owner_id: &str, content_hash: &str) -> Result<Option<Engram>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        Ok(t.engrams
            .iter()
            .find(|e| e.owner_id == owner_id && e.content_hash == content_hash)
            .cloned())
    }

    async fn vector_search(
        &self,
        owner_id: &str,
        embedding: &[f32],
        limit: usize,
        strand: Option<Strand>,
    ) -> Result<Vec<VectorHit>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        let mut hits: Vec<VectorHit> = t
            .engrams
            .iter()
            .filter(|e| e.owner_id == owner_id && strand.is_none_or(|s| e.strand == s))
            .map(|e| {
                let cosine = crate::mathkernel::cosine_similarity(&e.embedding, embedding);
                VectorHit {
                    engram: e.clone(),
                    score: cosine_to_unit_score(cosine),
                }
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn reinforce_engram(&self, owner_id: &str, id: &str, boost: f32) -> Result<Option<Engram>> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        let Some(slot) = t.engrams.iter_mut().find(|e| e.owner_id == owner_id && e.id == id) else {
            return Ok(None);
        };
        slot.set_signal((slot.signal + boost).min(1.0));
        Ok(Some(slot.clone()))
    }

    async fn decay_engrams(&self, owner_id: &str, strand: Strand, rate: f32, min_signal: f32) -> Result<usize> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        let mut affected = 0;
        for e in t.engrams.iter_mut().filter(|e| e.owner_id == owner_id && e.strand == strand) {
            let before = e.signal;
            let after = crate::signal::decay_signal(before, rate, min_signal);
            if after != before {
                e.set_signal(after);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn record_access(&self, owner_id: &str, id: &str) -> Result<()> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        if let Some(slot) = t.engrams.iter_mut().find(|e| e.owner_id == owner_id && e.id == id) {
            slot.record_access();
        }
        Ok(())
    }

    async fn create_synapse(&self, owner_id: &str, source_id: &str, target_id: &str, weight: f32) -> Result<Synapse> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        if let Some(existing) = t
            .synapses
            .iter_mut()
            .find(|s| s.owner_id == owner_id && s.source_id == source_id && s.target_id == target_id)
        {
            existing.reinforce(weight);
            return Ok(existing.clone());
        }
        let synapse = Synapse::new(owner_id, source_id, target_id, weight);
        t.synapses.push(synapse.clone());
        Ok(synapse)
    }

    async fn get_synapses_from(&self, owner_id: &str, source_id: &str) -> Result<Vec<Synapse>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        Ok(t.synapses
            .iter()
            .filter(|s| s.owner_id == owner_id && s.source_id == source_id)
            .cloned()
            .collect())
    }

    async fn reinforce_synapse(&self, owner_id: &str, source_id: &str, target_id: &str, boost: f32) -> Result<Option<Synapse>> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        let Some(slot) = t
            .synapses
            .iter_mut()
            .find(|s| s.owner_id == owner_id && s.source_id == source_id && s.target_id == target_id)
        else {
            return Ok(None);
        };
        slot.reinforce(boost);
        Ok(Some(slot.clone()))
    }

    async fn get_synapses_between(&self, owner_id: &str, a: &str, b: &str) -> Result<Vec<Synapse>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        Ok(t.synapses
            .iter()
            .filter(|s| {
                s.owner_id == owner_id
                    && ((s.source_id == a && s.target_id == b) || (s.source_id == b && s.target_id == a))
            })
            .cloned()
            .collect())
    }

    async fn create_chronicle(&self, chronicle: Chronicle) -> Result<Chronicle> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        t.chronicles.push(chronicle.clone());
        Ok(chronicle)
    }

    async fn get_chronicle(&self, owner_id: &str, id: &str) -> Result<Option<Chronicle>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        Ok(t.chronicles.iter().find(|c| c.owner_id == owner_id && c.id == id).cloned())
    }

    async fn update_chronicle(&self, chronicle: Chronicle) -> Result<Chronicle> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        let slot = t
            .chronicles
            .iter_mut()
            .find(|c| c.owner_id == chronicle.owner_id && c.id == chronicle.id)
            .ok_or_else(|| StoreError::NotFound(chronicle.id.clone()))?;
        *slot = chronicle.clone();
        Ok(chronicle)
    }

    async fn delete_chronicle(&self, owner_id: &str, id: &str) -> Result<()> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        if let Some(slot) = t.chronicles.iter_mut().find(|c| c.owner_id == owner_id && c.id == id) {
            if slot.is_open() {
                slot.effective_until = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn query_chronicles(&self, owner_id: &str, filter: ChronicleFilter) -> Result<Vec<Chronicle>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        let mut matches: Vec<Chronicle> = t
            .chronicles
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .filter(|c| filter.entity.as_deref().is_none_or(|e| c.entity == e))
            .filter(|c| filter.attribute.as_deref().is_none_or(|a| c.attribute == a))
            .filter(|c| filter.at.is_none_or(|t| c.matches_at(t)))
            .filter(|c| filter.from.is_none_or(|from| c.effective_from >= from))
            .filter(|c| filter.to.is_none_or(|to| c.effective_from < to))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.effective_from.cmp(&a.effective_from));
        Ok(matches)
    }

    async fn get_current_chronicle(&self, owner_id: &str, entity: &str, attribute: &str) -> Result<Option<Chronicle>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        Ok(t.chronicles
            .iter()
            .find(|c| c.owner_id == owner_id && c.entity == entity && c.attribute == attribute && c.is_open())
            .cloned())
    }

    async fn get_current_chronicles(&self, owner_id: &str, entity: Option<&str>) -> Result<Vec<Chronicle>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        Ok(t.chronicles
            .iter()
            .filter(|c| c.owner_id == owner_id && c.is_open() && entity.is_none_or(|e| c.entity == e))
            .cloned()
            .collect())
    }

    async fn get_timeline(&self, owner_id: &str, entity: &str) -> Result<Vec<Chronicle>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        let mut matches: Vec<Chronicle> = t
            .chronicles
            .iter()
            .filter(|c| c.owner_id == owner_id && c.entity == entity)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.effective_from.cmp(&b.effective_from));
        Ok(matches)
    }

    async fn create_nexus(&self, nexus: Nexus) -> Result<Nexus> {
        let mut t = self.tables.lock().map_err(|_| lock_err())?;
        t.nexuses.push(nexus.clone());
        Ok(nexus)
    }

    async fn get_related_chronicles(&self, owner_id: &str, chronicle_id: &str) -> Result<Vec<Chronicle>> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        let linked_ids: Vec<&str> = t
            .nexuses
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .filter_map(|n| {
                if n.origin_id == chronicle_id {
                    Some(n.linked_id.as_str())
                } else if n.linked_id == chronicle_id {
                    Some(n.origin_id.as_str())
                } else {
                    None
                }
            })
            .collect();
        Ok(t.chronicles
            .iter()
            .filter(|c| c.owner_id == owner_id && c.id != chronicle_id && linked_ids.contains(&c.id.as_str()))
            .cloned()
            .collect())
    }

    async fn get_stats(&self, owner_id: &str) -> Result<EngineStats> {
        let t = self.tables.lock().map_err(|_| lock_err())?;
        Ok(EngineStats {
            engram_count: t.engrams.iter().filter(|e| e.owner_id == owner_id).count() as i64,
            synapse_count: t.synapses.iter().filter(|s| s.owner_id == owner_id).count() as i64,
            chronicle_count: t.chronicles.iter().filter(|c| c.owner_id == owner_id).count() as i64,
            nexus_count: t.nexuses.iter().filter(|n| n.owner_id == owner_id).count() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn new_engram(owner: &str, content: &str) -> Engram {
        Engram::new(owner, content, content, Strand::General, vec![], HashMap::new(), vec![1.0, 0.0], 0.5, 0.1)
    }

    #[tokio::test]
    async fn create_and_get_engram_roundtrip() {
        let store = MemoryStore::new();
        let e = new_engram("owner", "hello");
        let created = store.create_engram(e.clone()).await.unwrap();
        let fetched = store.get_engram("owner", &created.id).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().content, "hello");
    }

    #[tokio::test]
    async fn delete_engram_cascades_synapses() {
        let store = MemoryStore::new();
        let a = store.create_engram(new_engram("owner", "a")).await.unwrap();
        let b = store.create_engram(new_engram("owner", "b")).await.unwrap();
        store.create_synapse("owner", &a.id, &b.id, 0.5).await.unwrap();
        store.delete_engram("owner", &a.id).await.unwrap();
        let remaining = store.get_synapses_from("owner", &a.id).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn create_synapse_upsert_saturates() {
        let store = MemoryStore::new();
        let a = store.create_engram(new_engram("owner", "a")).await.unwrap();
        let b = store.create_engram(new_engram("owner", "b")).await.unwrap();
        store.create_synapse("owner", &a.id, &b.id, 0.7).await.unwrap();
        let s = store.create_synapse("owner", &a.id, &b.id, 0.7).await.unwrap();
        assert_eq!(s.weight, 1.0);
    }

    #[tokio::test]
    async fn record_fact_current_chronicle_lookup() {
        let store = MemoryStore::new();
        let c = Chronicle::new("owner", "speaker", "phone", "Samsung", 1.0, Utc::now(), HashMap::new());
        store.create_chronicle(c).await.unwrap();
        let current = store.get_current_chronicle("owner", "speaker", "phone").await.unwrap();
        assert!(current.is_some());
    }
}
