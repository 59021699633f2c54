//! Configuration module for the embedding service.

use std::path::Path;

use crate::clients::LocalModelConfig;

/// Main service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub model_name: String,
    pub model_path: String,
    pub tokenizer_path: String,
    pub model_dimension: usize,
    pub max_length: usize,
    pub intra_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        let model = LocalModelConfig::default();
        Self {
            port: 3021,
            host: "0.0.0.0".to_string(),
            model_name: model.model_name,
            model_path: model.model_path,
            tokenizer_path: model.tokenizer_path,
            model_dimension: model.dimension,
            max_length: model.max_length,
            intra_threads: model.intra_threads,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            model_name: std::env::var("MODEL_NAME").unwrap_or(defaults.model_name),
            model_path: std::env::var("MODEL_PATH").unwrap_or(defaults.model_path),
            tokenizer_path: std::env::var("TOKENIZER_PATH").unwrap_or(defaults.tokenizer_path),
            model_dimension: env_parse("MODEL_DIMENSION").unwrap_or(defaults.model_dimension),
            max_length: env_parse("MODEL_MAX_LENGTH").unwrap_or(defaults.max_length),
            intra_threads: env_parse("MODEL_INTRA_THREADS").unwrap_or(defaults.intra_threads),
        }
    }

    /// Check that the model and tokenizer files are present on disk.
    pub fn validate_model_files(&self) -> Result<(), String> {
        if !Path::new(&self.model_path).exists() {
            return Err(format!("Model file not found: {}", self.model_path));
        }
        if !Path::new(&self.tokenizer_path).exists() {
            return Err(format!("Tokenizer file not found: {}", self.tokenizer_path));
        }
        Ok(())
    }

    /// Build the model loader configuration.
    pub fn to_local_model_config(&self) -> LocalModelConfig {
        LocalModelConfig {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            dimension: self.model_dimension,
            max_length: self.max_length,
            model_name: self.model_name.clone(),
            intra_threads: self.intra_threads,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_minilm() {
        let config = Config::default();
        assert_eq!(config.port, 3021);
        assert_eq!(config.model_name, "all-MiniLM-L6-v2");
        assert_eq!(config.model_dimension, 384);
        assert_eq!(config.max_length, 256);
    }

    #[test]
    fn test_validate_missing_files() {
        let config = Config {
            model_path: "/nonexistent/model.onnx".to_string(),
            ..Config::default()
        };
        let err = config.validate_model_files().unwrap_err();
        assert!(err.contains("/nonexistent/model.onnx"));
    }

    #[test]
    fn test_to_local_model_config() {
        let config = Config {
            model_name: "custom".to_string(),
            model_dimension: 768,
            ..Config::default()
        };
        let local = config.to_local_model_config();
        assert_eq!(local.model_name, "custom");
        assert_eq!(local.dimension, 768);
        assert_eq!(local.model_path, config.model_path);
    }
}
