//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{GooglePlacesAdapter, SqliteStorage},
    config::Config,
    error::ApiError,
    web::{router, AppState},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use matcher_core::{MatchingContext, MemoryStorage, SnapshotStorage};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Connects to SQLite and applies the embedded migrations.
async fn connect_sqlite(database_url: &str) -> Result<SqliteStorage, ApiError> {
    let storage = SqliteStorage::connect(database_url).await?;
    storage.run_migrations().await?;
    Ok(storage)
}

/// Opens the SQLite store, or falls back to memory if it cannot be used.
async fn open_storage(database_url: &str) -> Arc<dyn SnapshotStorage> {
    match connect_sqlite(database_url).await {
        Ok(storage) => {
            info!("Durable storage ready at {}", database_url);
            Arc::new(storage)
        }
        Err(e) => {
            warn!("{}. Sessions will not survive a restart.", e);
            Arc::new(MemoryStorage::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting matcher service...");

    // --- 2. Open Durable Storage & the Matching Context ---
    let storage = open_storage(&config.database_url).await;
    let matcher = MatchingContext::open(storage).await;
    info!("Local participant is {}", matcher.identity());

    // --- 3. Initialize the Candidate Provider ---
    if config.google_api_key.is_none() {
        warn!("GOOGLE_API_KEY is not set; creating matchings will fail until it is.");
    }
    let provider = Arc::new(GooglePlacesAdapter::new(
        reqwest::Client::new(),
        config.places_base_url.clone(),
        config.google_api_key.clone(),
    ));

    // --- 4. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(matcher, provider, config.clone()));

    let origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let app = router(app_state).layer(cors);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
