//! Association engine: synapse formation, path reinforcement, BFS expansion.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::{AssociationConfig, ReinforcementConfig};
use crate::error::Result;
use crate::store::Store;

/// Forms a synapse between every unordered pair of `engram_ids`. Upsert
/// semantics live in [`Store::create_synapse`]: weight saturates at `1.0`
/// on repeated creation.
pub async fn form_synapses(store: &dyn Store, owner_id: &str, engram_ids: &[String], config: AssociationConfig) -> Result<()> {
    for i in 0..engram_ids.len() {
        for j in (i + 1)..engram_ids.len() {
            store.create_synapse(owner_id, &engram_ids[i], &engram_ids[j], config.formation_weight).await?;
        }
    }
    Ok(())
}

/// Reinforces every directed synapse along an ordered path of engram ids.
/// Missing synapses are silently skipped.
pub async fn reinforce_path(store: &dyn Store, owner_id: &str, path: &[String], config: ReinforcementConfig) -> Result<()> {
    for pair in path.windows(2) {
        let (source, target) = (&pair[0], &pair[1]);
        store.reinforce_synapse(owner_id, source, target, config.synapse_boost).await?;
    }
    Ok(())
}

/// One BFS-visited node and the boost assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionHit {
    pub engram_id: String,
    pub boost: f32,
}

/// Breadth-first expansion along outgoing synapses starting from `seeds`.
///
/// Each visited node's boost is `parent_boost * synapse_weight *
/// decay_factor`; a node is visited at most once and its first-assigned
/// boost stands. Seeds themselves are never emitted. `max_depth = 0`
/// returns the empty list.
pub async fn expand(store: &dyn Store, owner_id: &str, seeds: &[String], config: AssociationConfig) -> Result<Vec<ExpansionHit>> {
    let mut visited: HashMap<String, f32> = HashMap::new();
    let seed_set: HashSet<&str> = seeds.iter().map(String::as_str).collect();

    if config.max_depth == 0 {
        return Ok(Vec::new());
    }

    let mut frontier: VecDeque<(String, f32, usize)> = VecDeque::new();
    for seed in seeds {
        frontier.push_back((seed.clone(), 1.0, 0));
    }

    while let Some((node, boost, depth)) = frontier.pop_front() {
        if depth >= config.max_depth {
            continue;
        }
        let outgoing = store.get_synapses_from(owner_id, &node).await?;
        for synapse in outgoing {
            let next_boost = boost * synapse.weight * config.decay_factor;
            if seed_set.contains(synapse.target_id.as_str()) {
                continue;
            }
            if visited.contains_key(&synapse.target_id) {
                continue;
            }
            visited.insert(synapse.target_id.clone(), next_boost);
            frontier.push_back((synapse.target_id, next_boost, depth + 1));
        }
    }

    let mut hits: Vec<ExpansionHit> = visited.into_iter().map(|(engram_id, boost)| ExpansionHit { engram_id, boost }).collect();
    hits.sort_by(|a, b| b.boost.partial_cmp(&a.boost).unwrap_or(std::cmp::Ordering::Equal));
    Ok(hits)
}
