//! Services module.

pub mod embedding;
pub mod validation;

pub use embedding::EmbeddingService;
pub use validation::validate_text_list;
