//! Synapse — a directed weighted association between two engrams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directed, weighted edge between two engrams owned by the same tenant.
///
/// `(source_id, target_id)` is unique; repeated creation saturates `weight`
/// at `1.0` rather than creating a duplicate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synapse {
    pub source_id: String,
    pub target_id: String,
    pub owner_id: String,
    pub weight: f32,
    pub formed_at: DateTime<Utc>,
    pub reinforced_at: DateTime<Utc>,
}

impl Synapse {
    /// Forms a new synapse with the given initial weight, clamped to `(0, 1]`.
    ///
    /// # Panics
    /// Panics if `source_id == target_id` — synapses are never self-loops.
    pub fn new(owner_id: impl Into<String>, source_id: impl Into<String>, target_id: impl Into<String>, weight: f32) -> Self {
        let source_id = source_id.into();
        let target_id = target_id.into();
        assert_ne!(source_id, target_id, "synapse source and target must differ");
        let now = Utc::now();
        Self {
            source_id,
            target_id,
            owner_id: owner_id.into(),
            weight: weight.clamp(f32::EPSILON, 1.0),
            formed_at: now,
            reinforced_at: now,
        }
    }

    /// Saturating reinforcement: `weight <- min(weight + boost, 1.0)`.
    pub fn reinforce(&mut self, boost: f32) {
        self.weight = (self.weight + boost).min(1.0);
        self.reinforced_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn rejects_self_loop() {
        Synapse::new("o", "a", "a", 0.5);
    }

    #[test]
    fn reinforce_saturates_at_one() {
        let mut s = Synapse::new("o", "a", "b", 0.9);
        s.reinforce(0.5);
        assert_eq!(s.weight, 1.0);
    }
}
