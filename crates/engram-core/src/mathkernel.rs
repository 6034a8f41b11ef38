//! Math kernel: cosine similarity, min-max normalization, clamp.
//!
//! Pure functions shared by the deduplicator, the store's vector-search
//! boundary mapping, and the retrieval pipeline's fusion step.

/// Cosine similarity in `[-1, 1]`. Returns `0.0` for mismatched lengths or a
/// zero-magnitude vector (degenerate embeddings carry no signal either way).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Maps a cosine similarity in `[-1, 1]` onto the `[0, 1]` "score" space the
/// store contract expects: a backend that returns raw cosine rather than a
/// pre-mapped similarity must be passed through this before use.
pub fn cosine_to_unit_score(cosine: f32) -> f32 {
    ((1.0 + cosine) / 2.0).clamp(0.0, 1.0)
}

/// Linear rescale of a score vector to `[0, 1]`.
///
/// A single-element vector normalizes to `1.0` if positive, else `0.0`.
/// Any longer vector where every value is equal normalizes to all zeros —
/// the single-element rule is a distinct case, not a special case of the
/// all-equal one.
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }
    if scores.len() == 1 {
        return vec![if scores[0] > 0.0 { 1.0 } else { 0.0 }];
    }
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if (max - min).abs() < f32::EPSILON {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|s| (s - min) / (max - min)).collect()
}

/// Clamps `x` into `[lo, hi]`.
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    x.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn cosine_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_to_unit_score_maps_range() {
        assert!((cosine_to_unit_score(1.0) - 1.0).abs() < 1e-6);
        assert!((cosine_to_unit_score(-1.0) - 0.0).abs() < 1e-6);
        assert!((cosine_to_unit_score(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn min_max_normalize_degenerate_all_equal() {
        assert_eq!(min_max_normalize(&[3.0, 3.0, 3.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn min_max_normalize_single_positive() {
        assert_eq!(min_max_normalize(&[5.0]), vec![1.0]);
    }

    #[test]
    fn min_max_normalize_single_nonpositive() {
        assert_eq!(min_max_normalize(&[0.0]), vec![0.0]);
        assert_eq!(min_max_normalize(&[-5.0]), vec![0.0]);
    }

    #[test]
    fn min_max_normalize_spread() {
        let out = min_max_normalize(&[1.0, 2.0, 3.0]);
        assert_eq!(out, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn min_max_normalize_empty() {
        assert!(min_max_normalize(&[]).is_empty());
    }
}
