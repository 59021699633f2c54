//! Local embedding model using ONNX Runtime.
//!
//! Runs the sentence-transformers `all-MiniLM-L6-v2` export entirely
//! on-device: HuggingFace tokenizer, one ONNX session call per batch,
//! attention-masked mean pooling, then L2 normalization.

use anyhow::{anyhow, bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::traits::EmbeddingModel;

/// Configuration for the local embedding model.
#[derive(Debug, Clone)]
pub struct LocalModelConfig {
    /// Path to the ONNX model file.
    pub model_path: String,
    /// Path to the tokenizer.json file.
    pub tokenizer_path: String,
    /// Output embedding dimension.
    pub dimension: usize,
    /// Maximum sequence length, in tokens.
    pub max_length: usize,
    /// Model name for identification.
    pub model_name: String,
    /// Threads ONNX Runtime may use within one operator.
    pub intra_threads: usize,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            model_path: "./models/all-MiniLM-L6-v2.onnx".to_string(),
            tokenizer_path: "./models/tokenizer.json".to_string(),
            dimension: 384,
            max_length: 256,
            model_name: "all-MiniLM-L6-v2".to_string(),
            intra_threads: 4,
        }
    }
}

/// Local embedding model backed by an ONNX Runtime session.
pub struct LocalEmbeddingModel {
    // `Session::run` needs exclusive access.
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    config: LocalModelConfig,
}

impl std::fmt::Debug for LocalEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEmbeddingModel")
            .field("model_name", &self.config.model_name)
            .field("dimension", &self.config.dimension)
            .field("max_length", &self.config.max_length)
            .finish_non_exhaustive()
    }
}

impl LocalEmbeddingModel {
    /// Load the model and tokenizer from disk.
    ///
    /// Runs one probe inference so a model whose output width differs from
    /// `config.dimension` is rejected here rather than on the first request.
    pub fn new(config: LocalModelConfig) -> Result<Self> {
        info!("Initializing local embedding model: {}", config.model_name);

        if !Path::new(&config.model_path).exists() {
            bail!(
                "Model file not found: {}. Please download the model first.",
                config.model_path
            );
        }
        if !Path::new(&config.tokenizer_path).exists() {
            bail!(
                "Tokenizer file not found: {}. Please download the tokenizer first.",
                config.tokenizer_path
            );
        }

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(&config.model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", config.model_path))?;

        info!("✓ ONNX session created for {}", config.model_name);

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        configure_truncation(&mut tokenizer, config.max_length)?;

        info!("✓ Tokenizer loaded");

        let model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            config,
        };

        let probe = model
            .run_batch(&["validation test".to_string()])
            .context("Validation inference failed")?;
        let width = probe.first().map(Vec::len).unwrap_or(0);
        if width != model.config.dimension {
            bail!(
                "Model outputs {} dimensions (expected {})",
                width,
                model.config.dimension
            );
        }

        Ok(model)
    }

    /// Create with default configuration (all-MiniLM-L6-v2).
    pub fn with_defaults() -> Result<Self> {
        Self::new(LocalModelConfig::default())
    }

    /// Run one inference over the whole batch.
    fn run_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batch = tokenize_batch(&self.tokenizer, texts)?;
        let shape = [batch.batch_size, batch.seq_len];

        let input_ids = Tensor::from_array((shape, batch.input_ids.clone().into_boxed_slice()))?;
        let attention_mask =
            Tensor::from_array((shape, batch.attention_mask.clone().into_boxed_slice()))?;
        let token_type_ids = Tensor::from_array((
            shape,
            vec![0i64; batch.batch_size * batch.seq_len].into_boxed_slice(),
        ))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Failed to lock session: {}", e))?;
        let outputs = session.run(ort::inputs![
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids,
        ])?;

        let (out_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract output tensor")?;
        let dims: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();

        debug!("Inference output shape: {:?}", dims);

        pool_output(&dims, data, &batch)
    }
}

impl EmbeddingModel for LocalEmbeddingModel {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        debug!("Encoding batch of {} texts", texts.len());
        self.run_batch(texts)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// Cap encodings at `max_length` tokens, special tokens included.
///
/// Truncation happens inside the tokenizer so the post-processor still
/// appends `[SEP]` to long inputs.
fn configure_truncation(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    Ok(())
}

/// Tokenize the batch and right-pad every row to the longest one.
fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String]) -> Result<TokenBatch> {
    let encodings = texts
        .iter()
        .map(|text| {
            tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let seq_len = encodings
        .iter()
        .map(|enc| enc.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut batch = TokenBatch {
        input_ids: Vec::with_capacity(texts.len() * seq_len),
        attention_mask: Vec::with_capacity(texts.len() * seq_len),
        batch_size: texts.len(),
        seq_len,
    };

    for encoding in &encodings {
        let ids = encoding.get_ids();
        let mask = encoding.get_attention_mask();

        batch.input_ids.extend(ids.iter().map(|&id| id as i64));
        batch.attention_mask.extend(mask.iter().map(|&m| m as i64));

        let padding = seq_len - ids.len();
        batch.input_ids.extend(std::iter::repeat(0i64).take(padding));
        batch.attention_mask.extend(std::iter::repeat(0i64).take(padding));
    }

    Ok(batch)
}

/// Turn the raw model output into one normalized vector per row.
fn pool_output(dims: &[usize], data: &[f32], batch: &TokenBatch) -> Result<Vec<Vec<f32>>> {
    if data.len() != dims.iter().product::<usize>() {
        bail!("Output tensor holds {} values for shape {:?}", data.len(), dims);
    }

    let mut embeddings = match *dims {
        [_, _, 0] | [_, 0] => bail!("Model output has zero width: {:?}", dims),
        // [batch, seq_len, hidden] token embeddings
        [n, seq_len, hidden] if n == batch.batch_size && seq_len == batch.seq_len => (0..n)
            .map(|i| {
                let tokens = &data[i * seq_len * hidden..(i + 1) * seq_len * hidden];
                let mask = &batch.attention_mask[i * seq_len..(i + 1) * seq_len];
                mean_pool(tokens, mask, hidden)
            })
            .collect::<Vec<_>>(),
        // [batch, hidden] already pooled
        [n, hidden] if n == batch.batch_size => data
            .chunks(hidden)
            .map(<[f32]>::to_vec)
            .collect::<Vec<_>>(),
        _ => bail!("Unexpected output tensor shape: {:?}", dims),
    };

    embeddings.iter_mut().for_each(|e| l2_normalize(e));
    Ok(embeddings)
}

/// Flattened, padded tokenizer output for one batch.
struct TokenBatch {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    batch_size: usize,
    seq_len: usize,
}

/// Average token vectors, ignoring padding positions.
///
/// `tokens` is row-major `[seq_len, hidden]`; `mask` has one entry per row.
fn mean_pool(tokens: &[f32], mask: &[i64], hidden: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden];
    let mut sum_mask = 0.0f32;

    for (row, &m) in tokens.chunks(hidden).zip(mask.iter()) {
        let weight = m as f32;
        sum_mask += weight;
        for (acc, &v) in pooled.iter_mut().zip(row) {
            *acc += v * weight;
        }
    }

    let denom = sum_mask.max(1e-9);
    pooled.iter_mut().for_each(|v| *v /= denom);
    pooled
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}
