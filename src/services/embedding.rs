//! Embedding service.
//!
//! Owns the loaded model and exposes `get_embeddings`: validate the input,
//! forward the whole batch to the model in one call, and translate model
//! failures into [`EmbeddingError::Generation`].

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::clients::LocalEmbeddingModel;
use crate::config::Config;
use crate::error::{EmbeddingError, Result};
use crate::services::validation::validate_text_list;
use crate::traits::EmbeddingModel;

/// Holds the model handle. Build once at startup and share by reference.
#[derive(Clone)]
pub struct EmbeddingService {
    model: Arc<dyn EmbeddingModel>,
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("model", &self.model.model_name())
            .field("dimension", &self.model.dimension())
            .finish()
    }
}

impl EmbeddingService {
    /// Load the local model described by `config`.
    ///
    /// Any failure is an [`EmbeddingError::Initialization`]; no service is
    /// produced in that case.
    pub fn new(config: &Config) -> Result<Self> {
        info!("Initializing embedding service with local model");

        let model = LocalEmbeddingModel::new(config.to_local_model_config())
            .map_err(EmbeddingError::initialization)?;

        info!(
            "✓ Local embedding model initialized: {} ({}D)",
            model.model_name(),
            model.dimension()
        );

        Ok(Self::with_model(Arc::new(model)))
    }

    /// Wrap an already-loaded model.
    pub fn with_model(model: Arc<dyn EmbeddingModel>) -> Self {
        Self { model }
    }

    /// Get the model name.
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Get the embedding dimension.
    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    /// Generate one embedding per string in `text_list`, in order.
    ///
    /// `text_list` must be a JSON array of strings; anything else fails with
    /// [`EmbeddingError::InvalidInput`] before the model is touched.
    pub fn get_embeddings(&self, text_list: &Value) -> Result<Vec<Vec<f32>>> {
        let texts = validate_text_list(text_list)?;
        self.embed_texts(&texts)
    }

    /// Generate embeddings for texts that are already known to be strings.
    pub fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!("Embedding batch of {} texts", texts.len());

        let embeddings = self.model.encode(texts).map_err(|e| {
            error!("Embedding generation failed: {:#}", e);
            EmbeddingError::generation(e)
        })?;

        self.check_output(texts.len(), &embeddings)?;

        Ok(embeddings)
    }

    fn check_output(&self, expected: usize, embeddings: &[Vec<f32>]) -> Result<()> {
        if embeddings.len() != expected {
            return Err(EmbeddingError::Generation(format!(
                "model returned {} embeddings for {} inputs",
                embeddings.len(),
                expected
            )));
        }

        let dimension = self.model.dimension();
        if let Some((index, e)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, e)| e.len() != dimension)
        {
            return Err(EmbeddingError::Generation(format!(
                "embedding {} has dimension {} (expected {})",
                index,
                e.len(),
                dimension
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic model: each vector is derived from the text's bytes.
    pub(crate) struct HashModel {
        pub dimension: usize,
        pub calls: AtomicUsize,
    }

    impl HashModel {
        pub(crate) fn new(dimension: usize) -> Self {
            Self {
                dimension,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl EmbeddingModel for HashModel {
        fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    (0..self.dimension)
                        .map(|i| {
                            t.bytes()
                                .enumerate()
                                .map(|(j, b)| ((b as usize * (i + 1) + j) % 97) as f32)
                                .sum::<f32>()
                        })
                        .collect()
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "hash-model"
        }
    }

    pub(crate) struct FailingModel;

    impl EmbeddingModel for FailingModel {
        fn encode(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Err(anyhow::anyhow!("out of memory").context("inference failed"))
        }

        fn dimension(&self) -> usize {
            384
        }

        fn model_name(&self) -> &str {
            "failing-model"
        }
    }

    /// Returns one vector too few.
    struct ShortModel;

    impl EmbeddingModel for ShortModel {
        fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.0; 4]; texts.len().saturating_sub(1)])
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "short-model"
        }
    }

    fn service() -> (EmbeddingService, Arc<HashModel>) {
        let model = Arc::new(HashModel::new(8));
        (EmbeddingService::with_model(model.clone()), model)
    }

    #[test]
    fn test_single_text() {
        let (service, _) = service();
        let embeddings = service.get_embeddings(&json!(["hello world"])).unwrap();
        assert_eq!(embeddings.len(), 1);
        assert_eq!(embeddings[0].len(), 8);
    }

    #[test]
    fn test_empty_list_skips_model() {
        let (service, model) = service();
        let embeddings = service.get_embeddings(&json!([])).unwrap();
        assert!(embeddings.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_order_preserved_with_single_batch_call() {
        let (service, model) = service();
        let input = json!(["first", "second", "third", "second"]);
        let embeddings = service.get_embeddings(&input).unwrap();

        assert_eq!(embeddings.len(), 4);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(embeddings[1], embeddings[3]);
        assert_ne!(embeddings[0], embeddings[1]);

        let alone = service.get_embeddings(&json!(["third"])).unwrap();
        assert_eq!(alone[0], embeddings[2]);
    }

    #[test]
    fn test_idempotent() {
        let (service, _) = service();
        let input = json!(["alpha", "beta"]);
        let a = service.get_embeddings(&input).unwrap();
        let b = service.get_embeddings(&input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bare_string_rejected_before_model() {
        let (service, model) = service();
        let err = service.get_embeddings(&json!("hello")).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidInput(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mixed_list_rejected_before_model() {
        let (service, model) = service();
        let err = service.get_embeddings(&json!(["hello", 42])).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::InvalidInput(crate::error::InvalidInput::NonStringElement {
                index: 1,
                ..
            })
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_model_failure_becomes_generation_error() {
        let service = EmbeddingService::with_model(Arc::new(FailingModel));
        let err = service.get_embeddings(&json!(["hello"])).unwrap_err();
        match err {
            EmbeddingError::Generation(msg) => {
                assert!(msg.contains("inference failed"));
                assert!(msg.contains("out of memory"));
            }
            other => panic!("expected generation error, got {:?}", other),
        }
    }

    #[test]
    fn test_short_output_is_not_returned() {
        let service = EmbeddingService::with_model(Arc::new(ShortModel));
        let err = service.embed_texts(&["a".to_string(), "b".to_string()]).unwrap_err();
        assert!(matches!(err, EmbeddingError::Generation(_)));
    }

    #[test]
    fn test_wrong_dimension_is_generation_error() {
        struct Narrow;
        impl EmbeddingModel for Narrow {
            fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
                Ok(vec![vec![1.0; 2]; texts.len()])
            }
            fn dimension(&self) -> usize {
                3
            }
            fn model_name(&self) -> &str {
                "narrow"
            }
        }

        let service = EmbeddingService::with_model(Arc::new(Narrow));
        let err = service.embed_texts(&["a".to_string()]).unwrap_err();
        assert!(err.to_string().contains("dimension 2"));
    }

    #[test]
    fn test_unavailable_model_fails_initialization() {
        let config = Config {
            model_path: "/nonexistent/all-MiniLM-L6-v2.onnx".to_string(),
            tokenizer_path: "/nonexistent/tokenizer.json".to_string(),
            ..Config::default()
        };
        let err = EmbeddingService::new(&config).unwrap_err();
        assert!(matches!(err, EmbeddingError::Initialization(_)));
        assert!(err.to_string().contains("Model file not found"));
    }
}
