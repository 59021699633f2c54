//! Error types for the embedding service.
//!
//! Callers of [`EmbeddingService::get_embeddings`](crate::services::EmbeddingService::get_embeddings)
//! only ever see [`EmbeddingError::InvalidInput`] or [`EmbeddingError::Generation`].
//! [`EmbeddingError::Initialization`] is reported once, at startup.

use thiserror::Error;

/// Result alias used across the service layer.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors surfaced by the embedding service.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The model could not be loaded. Fatal for the process.
    #[error("failed to load embedding model: {0}")]
    Initialization(String),

    /// The caller passed something other than a list of strings.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The model failed while encoding a validated batch.
    #[error("failed to generate embeddings: {0}")]
    Generation(String),
}

impl EmbeddingError {
    /// Wrap a model-load failure, keeping the full cause chain.
    pub fn initialization(err: anyhow::Error) -> Self {
        Self::Initialization(format!("{:#}", err))
    }

    /// Wrap an encoding failure, keeping the full cause chain.
    pub fn generation(err: anyhow::Error) -> Self {
        Self::Generation(format!("{:#}", err))
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Initialization(_) => "INITIALIZATION_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Generation(_) => "GENERATION_FAILED",
        }
    }
}

/// The input constraint that was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("input must be a list of strings, got {found}")]
    NotASequence { found: &'static str },

    #[error("all items must be strings, item {index} is {found}")]
    NonStringElement { index: usize, found: &'static str },
}
