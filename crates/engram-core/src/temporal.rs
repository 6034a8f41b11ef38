//! Temporal store: bitemporal chronicle record/query + nexus linking.
//!
//! A thin service layer over [`Store`]'s chronicle/nexus primitives — the
//! "at most one current value per `(owner_id, entity, attribute)`" invariant
//! is enforced here, by the record-then-expire sequence `record_fact` runs,
//! not by the store itself (this is not transactional at the engine layer;
//! a persistence driver that needs a strict guarantee must provide the
//! transaction itself).

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{Chronicle, Nexus};
use crate::store::{ChronicleFilter, Store};

/// Records a new current value for `(owner_id, entity, attribute)`.
///
/// If `effective_from` is not supplied, looks up the current chronicle for
/// the tuple; if one exists, closes it (`effective_until = now`) before
/// inserting the new one with `effective_from = now`, `effective_until =
/// None`.
#[allow(clippy::too_many_arguments)]
pub async fn record_fact(
    store: &dyn Store,
    owner_id: &str,
    entity: &str,
    attribute: &str,
    value: &str,
    certainty: f32,
    effective_from: Option<DateTime<Utc>>,
    metadata: HashMap<String, serde_json::Value>,
) -> Result<Chronicle> {
    let effective_from = match effective_from {
        Some(t) => t,
        None => {
            if let Some(current) = store.get_current_chronicle(owner_id, entity, attribute).await? {
                let mut closing = current;
                closing.effective_until = Some(Utc::now());
                store.update_chronicle(closing).await?;
            }
            Utc::now()
        }
    };

    let chronicle = Chronicle::new(owner_id, entity, attribute, value, certainty, effective_from, metadata);
    Ok(store.create_chronicle(chronicle).await?)
}

/// General chronicle query, any subset of the filter fields. Results are
/// ordered by `effective_from` descending — delegated to
/// [`Store::query_chronicles`].
pub async fn query(store: &dyn Store, owner_id: &str, filter: ChronicleFilter) -> Result<Vec<Chronicle>> {
    Ok(store.query_chronicles(owner_id, filter).await?)
}

/// All chronicles for `(owner_id, entity)`, `effective_from` ascending.
pub async fn timeline(store: &dyn Store, owner_id: &str, entity: &str) -> Result<Vec<Chronicle>> {
    Ok(store.get_timeline(owner_id, entity).await?)
}

/// Soft-deletes a chronicle: closes it iff currently open, a no-op
/// otherwise.
pub async fn expire(store: &dyn Store, owner_id: &str, id: &str) -> Result<()> {
    Ok(store.delete_chronicle(owner_id, id).await?)
}

/// Creates a typed directed nexus between two chronicles.
pub async fn link(
    store: &dyn Store,
    owner_id: &str,
    origin_id: &str,
    linked_id: &str,
    bond_type: &str,
    strength: f32,
    metadata: HashMap<String, serde_json::Value>,
) -> Result<Nexus> {
    let nexus = Nexus::new(owner_id, origin_id, linked_id, bond_type, strength, metadata);
    Ok(store.create_nexus(nexus).await?)
}

/// Chronicles reachable through either direction of a nexus touching `id`,
/// excluding `id` itself. A chronicle touched by multiple nexuses may
/// appear more than once — left as an implementation choice, not
/// deduplicated here (see the "Open Question decisions" entry in
/// DESIGN.md).
pub async fn related(store: &dyn Store, owner_id: &str, chronicle_id: &str) -> Result<Vec<Chronicle>> {
    Ok(store.get_related_chronicles(owner_id, chronicle_id).await?)
}
