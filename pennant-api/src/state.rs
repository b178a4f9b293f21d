//! Shared application state for Axum routers.

use std::sync::Arc;

use pennant_storage::{BannerService, LmdbBannerCache};

use crate::db::PgBannerStore;
use crate::middleware::AuthMiddlewareState;

/// Type alias for the banner service wired into the API.
///
/// Reads go through the LMDB cache (memory-mapped, persistent across
/// restarts); misses fall through to PostgreSQL and repopulate the cache.
pub type ApiBannerService = BannerService<PgBannerStore, LmdbBannerCache>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Raw database gateway (readiness probes, direct queries).
    pub db: PgBannerStore,
    /// Cache-aside banner service. Route handlers go through this for all
    /// banner reads and writes.
    pub service: Arc<ApiBannerService>,
    /// Authentication configuration for the middleware layers.
    pub auth: AuthMiddlewareState,
    /// Process start instant, handed to the health router for uptime.
    pub start_time: std::time::Instant,
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(PgBannerStore, db);
crate::impl_from_ref!(Arc<ApiBannerService>, service);
crate::impl_from_ref!(AuthMiddlewareState, auth);
