use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use veriface_core::SeetaFaceDetector;
use veriface_signals::{NoopFaceAnalyzer, NoopTextExtractor, RandomLookalike, WikipediaLookup};

mod config;
mod engine;
mod http;
mod progress;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("verifaced starting");

    let config = config::Config::from_env();
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // Fail fast: the daemon is useless without a detection model.
    let detector = Arc::new(SeetaFaceDetector::load(&config.model_path)?);

    let progress = progress::ProgressStore::new();
    let engine = Arc::new(engine::Engine::new(
        detector,
        Arc::new(NoopTextExtractor),
        Arc::new(NoopFaceAnalyzer),
        Arc::new(RandomLookalike),
        Arc::new(WikipediaLookup::new()),
        Arc::new(progress.clone()),
    ));

    let app = http::router(
        http::AppState {
            engine,
            progress,
            upload_dir: config.upload_dir.clone(),
        },
        config.max_upload_bytes,
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "verifaced listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("verifaced shutting down");
        })
        .await?;

    Ok(())
}
