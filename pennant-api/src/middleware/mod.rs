//! Axum middleware layers.

pub mod auth;

pub use auth::{
    auth_middleware, extract_auth_context, require_admin_middleware, AuthExtractor,
    AuthMiddlewareError, AuthMiddlewareState,
};
