//! Pennant API - REST API Layer
//!
//! This crate provides the HTTP surface of the banner rotation service.
//! It exposes Axum REST endpoints for end-user banner resolution and for
//! the administrative banner CRUD, backed by the cache-aside service in
//! pennant-storage over PostgreSQL and LMDB.

pub mod auth;
pub mod db;
pub mod error;
pub mod macros;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use auth::{
    authenticate, generate_jwt_token, validate_jwt_token, AuthConfig, AuthContext, Claims,
    JwtSecret,
};
pub use db::{DbConfig, PgBannerStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{
    auth_middleware, extract_auth_context, require_admin_middleware, AuthExtractor,
    AuthMiddlewareState,
};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::{ApiBannerService, AppState};
pub use types::*;
