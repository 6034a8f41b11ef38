//! Chronicle — a bitemporal entity-attribute-value assertion.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bitemporal entity-attribute-value assertion.
///
/// `effective_until = None` means "still current". At most one chronicle per
/// `(owner_id, entity, attribute)` is current at any wall-clock instant —
/// enforced by [`crate::temporal::record_fact`], not by this type itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chronicle {
    pub id: String,
    pub owner_id: String,
    pub entity: String,
    pub attribute: String,
    pub value: String,
    pub certainty: f32,
    pub effective_from: DateTime<Utc>,
    pub effective_until: Option<DateTime<Utc>>,
    pub recorded_at: DateTime<Utc>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Chronicle {
    pub fn new(
        owner_id: impl Into<String>,
        entity: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
        certainty: f32,
        effective_from: DateTime<Utc>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            entity: entity.into(),
            attribute: attribute.into(),
            value: value.into(),
            certainty: certainty.clamp(0.0, 1.0),
            effective_from,
            effective_until: None,
            recorded_at: Utc::now(),
            metadata,
        }
    }

    /// A chronicle matches `at = t` iff `effective_from <= t` and
    /// (`effective_until` is null or `effective_until > t`).
    pub fn matches_at(&self, t: DateTime<Utc>) -> bool {
        self.effective_from <= t && self.effective_until.is_none_or(|until| until > t)
    }

    /// Currently open iff `effective_until` is still `None`.
    pub fn is_open(&self) -> bool {
        self.effective_until.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn matches_at_half_open_semantics() {
        let now = Utc::now();
        let mut c = Chronicle::new("o", "speaker", "phone", "Samsung", 1.0, now - Duration::days(1), HashMap::new());
        assert!(c.matches_at(now));
        c.effective_until = Some(now);
        assert!(!c.matches_at(now));
        assert!(c.matches_at(now - Duration::seconds(1)));
    }

    #[test]
    fn open_until_expired() {
        let c = Chronicle::new("o", "e", "a", "v", 1.0, Utc::now(), HashMap::new());
        assert!(c.is_open());
    }
}
