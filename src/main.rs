//! Credit Scoring API - Main Entry Point
//!
//! Loads the pre-trained classifiers and the fitted preprocessor at startup,
//! then serves JSON prediction endpoints over HTTP. A missing or corrupt
//! artifact aborts startup before the listener is bound.

use anyhow::{Context, Result};
use credit_scoring_api::{
    config::{AppConfig, LoggingConfig},
    metrics::{ApiMetrics, MetricsReporter},
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_tracing(&config.logging)?;

    info!("Starting Credit Scoring API");
    info!(
        threshold = config.scoring.threshold,
        models_dir = %config.models.models_dir,
        "Configuration loaded successfully"
    );

    // Initialize metrics
    let metrics = Arc::new(ApiMetrics::new());

    // Load models and preprocessor; failure here prevents the server from
    // ever binding (fail fast, no retries)
    let state = Arc::new(
        AppState::from_config(&config, metrics.clone())
            .context("Failed to initialize API - models not loaded")?,
    );
    info!(
        lr_version = %state.versions.logistic_regression,
        rf_version = %state.versions.random_forest,
        "Models loaded successfully"
    );

    // Start metrics reporter (logs a summary every 60 seconds)
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics, 60);
        reporter.start().await;
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, server::router(state)).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("credit_scoring_api={}", logging.level).parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}
