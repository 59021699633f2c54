//! Embedding model clients.

pub mod local;

pub use local::{LocalEmbeddingModel, LocalModelConfig};
