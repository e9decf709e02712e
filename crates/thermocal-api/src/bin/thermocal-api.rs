//! thermocal REST API Server Binary
//!
//! See [`thermocal_api::config`] for the environment variables it reads.
//! `RUST_LOG` controls the log level (default: info).
//!
//! # Example
//!
//! ```bash
//! export FEEDBACK_DB_PATH=./feedback_db.json
//! export CORS_ALLOWED_ORIGINS=http://localhost:3000
//! cargo run --bin thermocal-api
//! ```

use anyhow::Context;
use std::sync::Arc;
use thermocal_api::{create_router, serve_with_shutdown, AppState, GracefulShutdown, ServerConfig};
use thermocal_core::{Calibrator, JsonFileStore};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("🚀 thermocal API starting...");

    let config = ServerConfig::from_env().context("invalid configuration")?;
    let estimator = &config.estimator;

    info!("Configuration:");
    info!("  Port: {}", config.port);
    info!("  Feedback store: {}", config.feedback_db_path.display());
    info!(
        "  Offset range: {:+.1} .. {:+.1}",
        estimator.min_offset, estimator.max_offset
    );
    info!("  Learning rate: {}", estimator.learning_rate);
    info!("  Seed policy: {}", estimator.seed_policy);
    info!("  CORS origins: {:?}", config.allowed_origins);

    let store = Arc::new(JsonFileStore::new(config.feedback_db_path.clone()));
    let calibrator = Arc::new(Calibrator::new(store, Arc::new(config.estimator.clone())));
    let router = create_router(AppState::new(calibrator), &config.allowed_origins);

    serve_with_shutdown(
        router,
        config.port,
        GracefulShutdown::with_timeout(config.shutdown_timeout),
    )
    .await
    .context("server error")?;

    Ok(())
}
