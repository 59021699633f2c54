//! API models for request/response types.
//!
//! Defines the JSON request/response structures for the embeddings API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request for embedding a list of texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// The texts to embed. Kept as raw JSON so the service can report
    /// exactly which constraint a malformed payload violates.
    #[serde(default)]
    pub texts: Value,
}

/// Response for an embedding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// One embedding per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimension of the embeddings.
    pub dimension: usize,
    /// Model used.
    pub model: String,
    /// Number of texts processed.
    pub count: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model: String,
    pub dimension: usize,
    pub endpoints: Vec<String>,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Error code (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
