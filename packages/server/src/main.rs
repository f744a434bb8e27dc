use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::PromptRegistry;
use common::storage::open_repository;
use tracing::{Level, info};

use server::config::AppConfig;
use server::seed::seed_default_prompts;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let repo = open_repository(&config.storage)
        .await
        .context("Failed to open prompt storage")?;
    info!(
        backend = ?config.storage.backend,
        path = %config.storage.path.display(),
        duplicate_policy = ?config.storage.duplicate_policy,
        "Prompt storage ready"
    );

    let registry = Arc::new(PromptRegistry::new(repo, config.storage.duplicate_policy));
    seed_default_prompts(&registry, &config.seed)
        .await
        .context("Failed to seed default prompts")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app = server::build_router(AppState { registry, config });

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
