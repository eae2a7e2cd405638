use std::sync::Arc;

use anyhow::Context;
use folio::app::{router, AppState};
use folio::config::{Settings, StoreBackend};
use folio::storage::client::FileStore;
use folio::storage::github::GitHubFileStore;
use folio::storage::memory::MemoryFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting folio admin API...");

    let settings = Settings::load()?;

    let store: Arc<dyn FileStore> = match settings.store {
        StoreBackend::Github => {
            let github = settings.github()?;
            tracing::info!(
                "Using GitHub store {}/{} on branch {}",
                github.owner,
                github.repo,
                github.branch
            );
            Arc::new(GitHubFileStore::new(github).context("Failed to build GitHub client")?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; content is lost on restart");
            Arc::new(MemoryFileStore::new())
        }
    };

    let admin_token = settings.admin_token();
    if admin_token.is_none() {
        tracing::warn!("FOLIO_ADMIN_TOKEN not set; admin API is unauthenticated");
    }

    let state = AppState::new(store, settings.content()).with_admin_token(admin_token);
    let app = router(state);

    tracing::info!("Listening on http://{}", settings.bind_addr);
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
