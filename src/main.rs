//! Embedding Service - Main Entry Point
//!
//! Loads the embedding model once, then serves it over HTTP.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use embedding_service::config::Config;
use embedding_service::handlers::{self, AppState};
use embedding_service::services::EmbeddingService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "embedding_service=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    info!("🚀 Starting Embedding Service v{}", env!("CARGO_PKG_VERSION"));
    info!("📦 Local Model: {} ({}D)", config.model_name, config.model_dimension);
    info!("🔧 Port: {}", config.port);

    // Validate model files exist
    match config.validate_model_files() {
        Ok(_) => info!("✅ Model files validated"),
        Err(e) => {
            tracing::error!("❌ Model files missing: {}", e);
            tracing::error!("Please download the model files:");
            tracing::error!("  - Model: {}", config.model_path);
            tracing::error!("  - Tokenizer: {}", config.tokenizer_path);
            tracing::error!("You can download all-MiniLM-L6-v2 from:");
            tracing::error!("  https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2");
            return Err(anyhow::anyhow!(e));
        }
    }

    // The model is loaded exactly once; without it the service never starts.
    let model_config = config.clone();
    let service = match tokio::task::spawn_blocking(move || EmbeddingService::new(&model_config))
        .await?
    {
        Ok(service) => {
            info!("✅ Embedding model initialized");
            Arc::new(service)
        }
        Err(e) => {
            tracing::error!("Failed to initialize embedding service: {}", e);
            return Err(e.into());
        }
    };

    let app = handlers::router(Arc::new(AppState { service }));

    let host: std::net::IpAddr = config.host.parse()?;
    let addr = SocketAddr::from((host, config.port));
    info!("✅ Embedding Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
