//! Pennant API Server Entry Point
//!
//! Bootstraps configuration, opens the LMDB banner cache, and starts the
//! Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use pennant_api::{
    create_api_router, ApiError, ApiResult, AppState, AuthConfig, AuthMiddlewareState, DbConfig,
    PgBannerStore,
};
use pennant_storage::{BannerService, LmdbBannerCache, ServiceConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_config = DbConfig::from_env();
    let db = PgBannerStore::from_config(&db_config)?;

    let cache_dir =
        std::env::var("PENNANT_CACHE_DIR").unwrap_or_else(|_| "./pennant-cache".to_string());
    let cache_size_mb = std::env::var("PENNANT_CACHE_SIZE_MB")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(256);
    let cache = LmdbBannerCache::new(&cache_dir, cache_size_mb)
        .map_err(|e| ApiError::cache_error(format!("Failed to open banner cache: {}", e)))?;

    let service_config = match std::env::var("PENNANT_BANNER_TTL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
    {
        Some(secs) => ServiceConfig::new().with_banner_ttl(Duration::from_secs(secs)),
        None => ServiceConfig::new(),
    };
    let service = Arc::new(BannerService::new(
        Arc::new(db.clone()),
        Arc::new(cache),
        service_config,
    ));

    let auth_config = AuthConfig::from_env();
    auth_config.validate_for_production()?;

    let state = AppState {
        db,
        service,
        auth: AuthMiddlewareState::new(auth_config),
        start_time: std::time::Instant::now(),
    };

    let app: Router = create_api_router(state);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Pennant API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("PENNANT_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("PENNANT_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
