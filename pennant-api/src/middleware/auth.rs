//! Axum Middleware for Authentication and Authorization
//!
//! This module provides Axum middleware that:
//! - Authenticates requests using JWT bearer tokens
//! - Injects AuthContext into request extensions
//! - Returns 401 for unauthenticated requests
//! - Returns 403 for non-admin access to management routes
//!
//! Tokens are read from the `Authorization: Bearer` header, with the plain
//! `token` header accepted as a fallback for older clients.

use crate::auth::{authenticate, AuthConfig, AuthContext};
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
///
/// This is passed to the middleware via Axum's State extractor.
#[derive(Debug, Clone)]
pub struct AuthMiddlewareState {
    /// Authentication configuration
    pub auth_config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    /// Create new middleware state with the given auth configuration.
    pub fn new(auth_config: AuthConfig) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
        }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTIONS
// ============================================================================

/// Axum middleware for authentication.
///
/// This middleware:
/// 1. Extracts the token (Authorization: Bearer, or the `token` header)
/// 2. Validates it using the auth module
/// 3. Returns 401 Unauthorized if authentication fails
/// 4. Injects AuthContext into request extensions on success
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let token_value = request
        .headers()
        .get("authorization")
        .or_else(|| request.headers().get("token"))
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            AuthMiddlewareError(ApiError::unauthorized(
                "Authentication required: provide Authorization header",
            ))
        })?;

    let auth_context =
        authenticate(&state.auth_config, token_value).map_err(AuthMiddlewareError)?;

    // Inject AuthContext into request extensions
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

/// Middleware that gates management routes behind the admin flag.
///
/// Must run after `auth_middleware`: it reads the injected AuthContext and
/// returns 403 for non-admin bearers.
pub async fn require_admin_middleware(
    request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_context = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| {
            AuthMiddlewareError(ApiError::internal_error(
                "AuthContext not found in request extensions. \
                 Ensure auth_middleware is applied before require_admin_middleware.",
            ))
        })?;

    if !auth_context.is_admin {
        return Err(AuthMiddlewareError(ApiError::forbidden(
            "Admin access required",
        )));
    }

    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
///
/// This allows the middleware to return errors that are automatically
/// converted to HTTP responses with appropriate status codes.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        let api_error = self.0;

        let status = match api_error.code {
            crate::error::ErrorCode::Unauthorized
            | crate::error::ErrorCode::InvalidToken
            | crate::error::ErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            crate::error::ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            crate::error::ErrorCode::MissingField
            | crate::error::ErrorCode::InvalidFormat
            | crate::error::ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, axum::Json(api_error)).into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for authentication context.
///
/// This extractor implements `FromRequestParts`, allowing it to be used
/// directly in route handler signatures. It requires `auth_middleware` to
/// have run; without it the extractor returns a 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Extract AuthContext from request extensions.
pub fn extract_auth_context(request: &Request) -> ApiResult<&AuthContext> {
    request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::unauthorized("Auth context missing from request"))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt_token, JwtSecret};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn test_auth_config() -> AuthConfig {
        let mut config = AuthConfig::default();
        config.jwt_secret =
            JwtSecret::new("test_secret".to_string()).expect("test secret should be valid");
        config
    }

    fn test_app() -> Router {
        let auth_state = AuthMiddlewareState::new(test_auth_config());

        Router::new()
            .route("/protected", get(|| async { "Protected resource" }))
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
    }

    fn admin_app() -> Router {
        let auth_state = AuthMiddlewareState::new(test_auth_config());

        Router::new()
            .route("/admin", get(|| async { "Admin resource" }))
            .layer(middleware::from_fn(require_admin_middleware))
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
    }

    #[tokio::test]
    async fn test_middleware_with_valid_token() -> Result<(), String> {
        let app = test_app();
        let token = generate_jwt_token(&test_auth_config(), "user123".to_string(), false)
            .map_err(|e| e.message)?;

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_token_header_fallback() -> Result<(), String> {
        let app = test_app();
        let token = generate_jwt_token(&test_auth_config(), "user123".to_string(), false)
            .map_err(|e| e.message)?;

        let request = Request::builder()
            .uri("/protected")
            .header("token", token)
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_without_authentication() -> Result<(), String> {
        let app = test_app();

        let request = Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_middleware_with_invalid_token() -> Result<(), String> {
        let app = test_app();

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", "Bearer invalid.jwt.token")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_gate_allows_admin() -> Result<(), String> {
        let app = admin_app();
        let token = generate_jwt_token(&test_auth_config(), "admin".to_string(), true)
            .map_err(|e| e.message)?;

        let request = Request::builder()
            .uri("/admin")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_gate_rejects_plain_user() -> Result<(), String> {
        let app = admin_app();
        let token = generate_jwt_token(&test_auth_config(), "user123".to_string(), false)
            .map_err(|e| e.message)?;

        let request = Request::builder()
            .uri("/admin")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        Ok(())
    }

    #[tokio::test]
    async fn test_auth_extractor_with_valid_auth() -> Result<(), String> {
        let auth_state = AuthMiddlewareState::new(test_auth_config());

        async fn handler(AuthExtractor(auth): AuthExtractor) -> String {
            format!("User: {}, Admin: {}", auth.user_id, auth.is_admin)
        }

        let app = Router::new()
            .route("/protected", get(handler))
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

        let token = generate_jwt_token(&test_auth_config(), "user123".to_string(), true)
            .map_err(|e| e.message)?;

        let request = Request::builder()
            .uri("/protected")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| format!("Failed to read body: {:?}", e))?;
        let body_str =
            String::from_utf8(body.to_vec()).map_err(|e| format!("Invalid UTF-8 body: {}", e))?;

        assert!(body_str.contains("User: user123"));
        assert!(body_str.contains("Admin: true"));
        Ok(())
    }

    #[tokio::test]
    async fn test_auth_extractor_without_middleware() -> Result<(), String> {
        async fn handler(AuthExtractor(_auth): AuthExtractor) -> String {
            "Should not reach here".to_string()
        }

        // Router WITHOUT auth middleware
        let app = Router::new().route("/unprotected", get(handler));

        let request = Request::builder()
            .uri("/unprotected")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }
}
