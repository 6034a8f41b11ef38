//! Okapi BM25 scorer, applied only to a candidate shortlist.
//!
//! Not a corpus-wide index: document frequency is computed across the
//! supplied candidate set, and length normalization uses that same
//! candidate set's mean document length. `k1 = 1.5`, `b = 0.75` by default
//! (see [`crate::config::Bm25Config`]).

use std::collections::HashMap;

use crate::config::Bm25Config;
use crate::tokenizer::tokenize;

/// Scores `query` against every document in `candidates`, returning scores
/// in the same order as `candidates`. Empty query or empty candidate set
/// returns all zeros.
pub fn score_candidates(query: &str, candidates: &[&str], config: Bm25Config) -> Vec<f32> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() || candidates.is_empty() {
        return vec![0.0; candidates.len()];
    }

    let doc_tokens: Vec<Vec<String>> = candidates.iter().map(|d| tokenize(d)).collect();
    let n = doc_tokens.len() as f32;
    let avg_len = doc_tokens.iter().map(|t| t.len() as f32).sum::<f32>() / n;

    // Document frequency per query term, over the candidate set only.
    let mut df: HashMap<&str, f32> = HashMap::new();
    for term in &query_tokens {
        let count = doc_tokens
            .iter()
            .filter(|doc| doc.iter().any(|t| t == term))
            .count() as f32;
        df.insert(term.as_str(), count);
    }

    doc_tokens
        .iter()
        .map(|doc| {
            let doc_len = doc.len() as f32;
            let mut tf_counts: HashMap<&str, f32> = HashMap::new();
            for tok in doc {
                *tf_counts.entry(tok.as_str()).or_insert(0.0) += 1.0;
            }

            query_tokens
                .iter()
                .map(|term| {
                    let tf = *tf_counts.get(term.as_str()).unwrap_or(&0.0);
                    if tf == 0.0 {
                        return 0.0;
                    }
                    let term_df = *df.get(term.as_str()).unwrap_or(&0.0);
                    let idf = ((n - term_df + 0.5) / (term_df + 0.5) + 1.0).ln();
                    let numerator = tf * (config.k1 + 1.0);
                    let denominator =
                        tf + config.k1 * (1.0 - config.b + config.b * (doc_len / avg_len.max(1.0)));
                    idf * (numerator / denominator)
                })
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_returns_zeros() {
        let scores = score_candidates("", &["a document", "another document"], Bm25Config::default());
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn empty_candidates_returns_empty() {
        let scores = score_candidates("query", &[], Bm25Config::default());
        assert!(scores.is_empty());
    }

    #[test]
    fn matching_document_scores_higher_than_nonmatching() {
        let scores = score_candidates(
            "samsung galaxy",
            &["I have a Samsung Galaxy phone", "completely unrelated text"],
            Bm25Config::default(),
        );
        assert!(scores[0] > scores[1]);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn all_docs_matching_have_positive_scores() {
        let scores = score_candidates(
            "cat",
            &["a cat sat", "the cat ran", "cat cat cat"],
            Bm25Config::default(),
        );
        assert!(scores.iter().all(|&s| s > 0.0));
    }
}
