//! Completion provider contract and the native, rule-based implementation
//! the fact extractor falls back to when no external model is configured —
//! a deterministic "native" variant shipped behind the external-service
//! trait as a first-class option, not a test double.

use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::model::Strand;

/// `completeJson(system, user)`: sends a system prompt and raw user text,
/// expects a parsed JSON object back. The extractor is the only caller and
/// owns both prompt strings.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete_json(&self, system: &str, user: &str) -> Result<Value, ProviderError>;
}

/// Deterministic, dependency-free extraction: splits `user` into clauses,
/// guesses a strand from keyword cues, and pattern-matches a handful of
/// "X is/uses/switched to Y" phrasings into temporal facts. Never errors —
/// worst case it returns the input text as a single fact with strand
/// `general` and no temporal facts, which is exactly the extractor's own
/// fallback shape, so a native-only deployment behaves identically to one
/// where every call degraded to the fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCompletionProvider;

/// Keyword cues used to guess a strand when none is supplied by the caller.
/// Checked in order; the first match wins.
const STRAND_CUES: &[(Strand, &[&str])] = &[
    (Strand::Preferential, &["prefer", "like", "favorite", "love", "hate", "enjoy"]),
    (Strand::Procedural, &["how to", "step", "first,", "then,", "process", "recipe"]),
    (Strand::Relational, &["friend", "colleague", "brother", "sister", "partner", "manager", "team"]),
    (Strand::Experiential, &["went to", "visited", "experienced", "felt", "remember when", "yesterday"]),
];

/// `(entity, attribute, value)` phrasings recognized by the heuristic
/// extractor. `{0}` is the subject captured before the cue, `{1}` the value
/// captured after it.
const TEMPORAL_CUES: &[(&str, &str)] = &[
    ("switched to", "uses"),
    ("switched from", "uses"),
    ("now uses", "uses"),
    ("is using", "uses"),
    ("i use", "uses"),
    ("i am", "is"),
    ("i'm", "is"),
    ("lives in", "location"),
    ("works at", "employer"),
    ("works as", "role"),
];

impl NativeCompletionProvider {
    fn split_clauses(text: &str) -> Vec<String> {
        text.split(|c: char| matches!(c, '.' | '!' | '?' | ';'))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn guess_strand(text: &str) -> Strand {
        let lower = text.to_lowercase();
        for (strand, cues) in STRAND_CUES {
            if cues.iter().any(|cue| lower.contains(cue)) {
                return *strand;
            }
        }
        Strand::General
    }

    fn extract_temporal_facts(clause: &str) -> Vec<Value> {
        let lower = clause.to_lowercase();
        for (cue, attribute) in TEMPORAL_CUES {
            if let Some(idx) = lower.find(cue) {
                let subject = clause[..idx].trim().trim_start_matches("I ").trim();
                let value = clause[idx + cue.len()..].trim();
                if !value.is_empty() {
                    let entity = if subject.is_empty() { "self" } else { subject };
                    return vec![json!({
                        "entity": entity,
                        "attribute": attribute,
                        "value": value,
                    })];
                }
            }
        }
        Vec::new()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for NativeCompletionProvider {
    async fn complete_json(&self, _system: &str, user: &str) -> Result<Value, ProviderError> {
        let clauses = Self::split_clauses(user);
        if clauses.is_empty() {
            return Ok(json!({ "facts": [], "strand": "general", "temporalFacts": [] }));
        }

        let strand = Self::guess_strand(user);
        let mut temporal_facts = Vec::new();
        for clause in &clauses {
            temporal_facts.extend(Self::extract_temporal_facts(clause));
        }

        Ok(json!({
            "facts": clauses,
            "strand": strand.as_str(),
            "temporalFacts": temporal_facts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn splits_sentences_into_facts() {
        let provider = NativeCompletionProvider;
        let result = provider.complete_json("sys", "I went hiking. I cooked dinner.").await.unwrap();
        let facts = result["facts"].as_array().unwrap();
        assert_eq!(facts.len(), 2);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_facts_and_general_strand() {
        let provider = NativeCompletionProvider;
        let result = provider.complete_json("sys", "   ").await.unwrap();
        assert_eq!(result["facts"].as_array().unwrap().len(), 0);
        assert_eq!(result["strand"], "general");
    }

    #[tokio::test]
    async fn recognizes_switched_to_as_temporal_fact() {
        let provider = NativeCompletionProvider;
        let result = provider.complete_json("sys", "I switched to an iPhone.").await.unwrap();
        let facts = result["temporalFacts"].as_array().unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0]["attribute"], "uses");
        assert_eq!(facts[0]["value"], "an iPhone");
    }

    #[tokio::test]
    async fn preference_language_guesses_preferential_strand() {
        let provider = NativeCompletionProvider;
        let result = provider.complete_json("sys", "I love hiking in the mountains").await.unwrap();
        assert_eq!(result["strand"], "preferential");
    }
}
