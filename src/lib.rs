//! Embedding Service - Library Entry Point
//!
//! Validates lists of texts and turns them into sentence embeddings with a
//! local ONNX all-MiniLM-L6-v2 model. Runs entirely on-device.

pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use clients::{LocalEmbeddingModel, LocalModelConfig};
pub use config::Config;
pub use error::{EmbeddingError, InvalidInput};
pub use services::EmbeddingService;
pub use traits::EmbeddingModel;
