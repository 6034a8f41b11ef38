//! Engine-level error types.
//!
//! Validation and not-found are refused at the engine boundary,
//! provider/store failures propagate, and the soft failures (chronicle
//! recording inside ingestion, post-retrieval access reinforcement,
//! chronicle matching inside search) are caught and logged by the
//! orchestrator, never surfaced through [`EngineError`].

use thiserror::Error;

/// Error surfaced by a [`crate::store::Store`] implementation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Error surfaced by an [`crate::embed::Embedder`] or
/// [`crate::completion::CompletionProvider`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider error: {0}")]
    Failed(String),
}

/// Top-level engine error.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
