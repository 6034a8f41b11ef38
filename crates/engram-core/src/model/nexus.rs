//! Nexus — a typed directional link between two chronicles.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed directional link between two chronicles.
///
/// Conventional `bond_type` values include `superseded_by`, `caused_by`,
/// `related_to`, but the field is free-form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nexus {
    pub id: String,
    pub owner_id: String,
    pub origin_id: String,
    pub linked_id: String,
    pub bond_type: String,
    pub strength: f32,
    pub effective_from: DateTime<Utc>,
    pub effective_until: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Nexus {
    pub fn new(
        owner_id: impl Into<String>,
        origin_id: impl Into<String>,
        linked_id: impl Into<String>,
        bond_type: impl Into<String>,
        strength: f32,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            origin_id: origin_id.into(),
            linked_id: linked_id.into(),
            bond_type: bond_type.into(),
            strength: strength.clamp(0.0, 1.0),
            effective_from: Utc::now(),
            effective_until: None,
            metadata,
        }
    }
}
