//! REST API Routes Module
//!
//! This module contains all route handlers:
//! - User banner resolution at /user_banner (authenticated)
//! - Banner management CRUD at /banner (authenticated, admin only)
//! - Health check endpoints at /health/* (public, Kubernetes-compatible)
//! - OpenAPI spec at /openapi.json
//! - CORS support for browser-based clients

pub mod banner;
pub mod health;
pub mod user_banner;

use axum::{
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

use crate::middleware::{auth_middleware, require_admin_middleware};
use crate::state::AppState;

// Re-export route creation functions for convenience
pub use banner::create_router as banner_router;
pub use health::create_router as health_router;
pub use user_banner::create_router as user_banner_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;

    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS (outermost) - handles preflight requests
/// 2. Trace - request/response logging
/// 3. Auth - validates bearer tokens on /user_banner and /banner
/// 4. Admin gate - /banner only
///
/// Health endpoints and the OpenAPI spec are public.
pub fn create_api_router(state: AppState) -> Router {
    let auth_state = state.auth.clone();

    // End-user read path: any authenticated bearer.
    let user_routes = user_banner::create_router().layer(from_fn_with_state(
        auth_state.clone(),
        auth_middleware,
    ));

    // Management surface: admin bearers only. Layers run bottom-up, so
    // auth_middleware executes before require_admin_middleware.
    let admin_routes = banner::create_router()
        .layer(from_fn(require_admin_middleware))
        .layer(from_fn_with_state(auth_state, auth_middleware));

    let router = Router::new()
        .nest("/user_banner", user_routes)
        .nest("/banner", admin_routes)
        .with_state(state.clone())
        // Health checks (no auth required)
        .nest(
            "/health",
            health::create_router(state.db.clone(), state.start_time),
        );

    #[cfg(feature = "openapi")]
    let router = router.route("/openapi.json", axum::routing::get(openapi_json));

    router
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

/// Build the CORS layer.
///
/// Banner reads are consumed by browser clients on arbitrary origins, so the
/// policy is permissive: any origin, the methods the API serves, and the
/// headers the auth middleware reads.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("token"),
        ])
}
