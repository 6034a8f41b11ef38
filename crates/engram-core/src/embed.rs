//! Embedding provider contract.
//!
//! The engine is generic over [`Embedder`]; [`HashEmbedder`] is the
//! first-class, dependency-free implementation used for local
//! development and tests — a deterministic "native" embedding variant
//! sitting behind the same narrow surface a production model-backed
//! embedder would expose.

use crate::error::ProviderError;

/// Produces fixed-dimension embeddings for text.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// The dimensionality of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(self.embed_batch(std::slice::from_ref(&text.to_string())).await?.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Deterministic feature-hashing embedder.
///
/// Each token is hashed into one of `dimensions` buckets; the bucket's sign
/// is derived from a second hash bit so opposite tokens can cancel rather
/// than only ever accumulate (the standard "hashing trick" construction).
/// The result is L2-normalized, so `cosine_similarity` behaves as it would
/// for a model-backed embedder's unit vectors.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        for token in crate::tokenizer::tokenize(text) {
            let h = fnv1a(token.as_bytes());
            let bucket = (h % self.dimensions as u64) as usize;
            let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
        v
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[async_trait::async_trait]
impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
