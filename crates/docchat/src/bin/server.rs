//! Document chat server binary

use docchat::{server, AppConfig, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docchat=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        embedding_model = %config.embeddings.model,
        generation_model = %config.llm.model,
        data_dir = %config.storage.data_dir.display(),
        "Starting docchat server"
    );

    let state = AppState::new(config).await?;

    match state.llm.health_check().await {
        Ok(true) => tracing::info!(provider = state.llm.name(), "Generation service reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!("Generation service unreachable at startup, requests may fail");
        }
    }

    server::serve(state).await?;
    Ok(())
}
