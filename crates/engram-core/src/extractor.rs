//! Fact extractor.
//!
//! Wraps a [`crate::completion::CompletionProvider`] and turns its raw JSON
//! into a typed [`ExtractedFacts`]. Provider error, malformed output, or an
//! unrecognized strand name all degrade to the same fallback: the raw input
//! as a single `general`-strand fact with no temporal facts.

use serde::Deserialize;

use crate::completion::CompletionProvider;
use crate::model::Strand;

const SYSTEM_PROMPT: &str = "Extract standalone facts from the user's message. \
Respond with a JSON object: {\"facts\": string[], \"strand\": string, \
\"temporalFacts\": {\"entity\": string, \"attribute\": string, \"value\": string}[]}. \
Valid strands are: factual, experiential, procedural, preferential, relational, general.";

/// One `(entity, attribute, value)` candidate pulled from raw text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemporalFactCandidate {
    pub entity: String,
    pub attribute: String,
    pub value: String,
}

/// The extractor's output: standalone facts, a classified strand, and any
/// temporal facts recognized in the same pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFacts {
    pub facts: Vec<String>,
    pub strand: Strand,
    pub temporal_facts: Vec<TemporalFactCandidate>,
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    facts: Vec<String>,
    strand: String,
    #[serde(rename = "temporalFacts", default)]
    temporal_facts: Vec<TemporalFactCandidate>,
}

const KNOWN_STRANDS: &[&str] = &["factual", "experiential", "procedural", "preferential", "relational", "general"];

fn fallback(raw_input: &str) -> ExtractedFacts {
    ExtractedFacts {
        facts: vec![raw_input.to_string()],
        strand: Strand::General,
        temporal_facts: Vec::new(),
    }
}

/// Runs extraction against `provider`, falling back to the raw-input shape
/// on any provider error, malformed JSON, missing fields, or unrecognized
/// strand name. Never returns `Err`.
pub async fn extract(provider: &dyn CompletionProvider, raw_input: &str) -> ExtractedFacts {
    let Ok(value) = provider.complete_json(SYSTEM_PROMPT, raw_input).await else {
        return fallback(raw_input);
    };

    let Ok(raw) = serde_json::from_value::<RawExtraction>(value) else {
        return fallback(raw_input);
    };

    if !KNOWN_STRANDS.contains(&raw.strand.to_lowercase().as_str()) {
        return fallback(raw_input);
    }

    ExtractedFacts {
        facts: raw.facts,
        strand: Strand::parse_name(&raw.strand),
        temporal_facts: raw.temporal_facts,
    }
}
