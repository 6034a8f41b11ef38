//! Data model
//!
//! Four entities, each owned exclusively by a single tenant (`owner_id`):
//! [`Engram`] (atomic memory unit), [`Synapse`] (directed weighted
//! association between two engrams), [`Chronicle`] (bitemporal
//! entity-attribute-value assertion), and [`Nexus`] (typed link between
//! two chronicles).

mod chronicle;
mod engram;
mod nexus;
mod synapse;

pub use chronicle::Chronicle;
pub use engram::{Engram, Strand};
pub use nexus::Nexus;
pub use synapse::Synapse;
