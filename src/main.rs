use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use watchlist_api::{
    api::{create_router, AppState},
    config::{Config, StoreBackend},
    db::{self, Cache, CacheWriterHandle, MemoryStore, PgStore, Store},
    services::{
        providers::{CachedProvider, OmdbProvider},
        AuthSettings, MovieProvider,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("watchlist_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Connected to Postgres and applied migrations");
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let metadata_timeout = Duration::from_secs(config.metadata_timeout_secs);
    let omdb: Arc<dyn MovieProvider> = Arc::new(OmdbProvider::new(
        config.omdb_api_key.clone(),
        config.omdb_api_url.clone(),
        metadata_timeout,
    )?);

    let (movie_provider, cache_writer): (Arc<dyn MovieProvider>, Option<CacheWriterHandle>) =
        match &config.redis_url {
            Some(redis_url) => {
                let client = db::create_redis_client(redis_url)?;
                let (cache, handle) = Cache::new(client);
                tracing::info!("Metadata lookups cached in Redis");
                let cached: Arc<dyn MovieProvider> = Arc::new(CachedProvider::new(
                    omdb,
                    cache,
                    config.metadata_cache_ttl_secs,
                ));
                (cached, Some(handle))
            }
            None => (omdb, None),
        };

    let auth = AuthSettings {
        bcrypt_cost: config.bcrypt_cost,
        session_ttl: chrono::Duration::hours(config.session_ttl_hours),
    };

    let state = AppState::new(store, movie_provider, auth, metadata_timeout);
    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
