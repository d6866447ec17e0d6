use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use carepulse_compute::InsightEngine;
use carepulse_core::config::{load_dotenv, Config};
use carepulse_rules::loader::load_or_default;
use carepulse_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    config.log_summary();

    let insight_config = load_or_default(config.insights.config_path.as_deref())
        .context("failed to load insight config")?;
    let engine = InsightEngine::new(insight_config)?;
    let state = Arc::new(AppState::new(engine));

    let app = build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
