use railmeal_server::cache::CachedStore;
use railmeal_server::config::{AppConfig, StoreSettings};
use railmeal_server::store::{DataStore, MemoryStore, RestStore};
use railmeal_server::web::{AppState, create_router};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "railmeal_server=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;

    match &config.store {
        StoreSettings::Fixtures(dir) => {
            tracing::info!("Loading fixtures from {}", dir.display());
            let store = MemoryStore::from_dir(dir, config.eligibility.local_offset())?;
            serve(store, &config).await
        }
        StoreSettings::Rest(rest) => {
            tracing::info!("Using data store at {}", rest.base_url);
            let store = RestStore::new(rest.clone())?;
            serve(store, &config).await
        }
    }
}

async fn serve<S: DataStore + 'static>(store: S, config: &AppConfig) -> Result<(), BoxError> {
    let store = CachedStore::new(store, &config.cache);
    let app = create_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Rail meal server listening on http://{}", config.bind_addr);
    tracing::info!("API Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /api/trains/:train/route");
    tracing::info!("  GET  /api/trains/:train/stations/:station/restaurants");
    tracing::info!("  GET  /api/stations/:station/restaurants");
    tracing::info!("  GET  /api/restaurants/:code/menu");
    tracing::info!("  POST /api/eligibility");
    tracing::info!("  POST /api/cart/quote");
    tracing::info!("  POST /api/drafts, GET|PUT|DELETE /api/drafts/:id");
    tracing::info!("  POST /api/drafts/:id/checkout");
    tracing::info!("  POST /api/orders");

    axum::serve(listener, app).await?;
    Ok(())
}
