use shopping_assistant::{
    agent::{Collaborators, Orchestrator},
    api::start_server,
    catalog::Catalog,
    config::AssistantConfig,
    state::InMemorySessionStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AssistantConfig::from_env()?;

    info!("🛒 SAM AI shopping assistant - API Server");
    info!("📍 Port: {}", config.port);
    info!("📂 Data: {}", config.data_dir.display());

    let catalog = Arc::new(Catalog::load_from_dir(&config.data_dir));
    let collaborators = Collaborators::from_config(&config)?;
    let sessions = Arc::new(InMemorySessionStore::new());

    let orchestrator = Arc::new(Orchestrator::new(
        catalog,
        collaborators,
        sessions,
        config.max_selection_retries,
    )?);

    info!("✅ Orchestrator initialized");

    // Evict idle sessions in the background
    let sweeper = orchestrator.clone();
    let idle_timeout = config.session_idle_timeout;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sweeper.evict_idle(idle_timeout).await;
        }
    });

    info!("📡 Starting API server...");
    start_server(orchestrator, config.port).await?;

    Ok(())
}
