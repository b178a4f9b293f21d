//! User-Facing Banner Route
//!
//! This module implements the read path end users hit: resolve the single
//! banner for a (tag, feature) pair through the cache-aside service.
//!
//! Admin bearers receive the full banner record; regular users receive only
//! the banner content document.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use pennant_core::Banner;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    state::{ApiBannerService, AppState},
    types::UserBannerParams,
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /user_banner - Resolve the banner for a (tag, feature) pair
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/user_banner",
    tag = "Banners",
    params(UserBannerParams),
    responses(
        (status = 200, description = "Banner content (full record for admins)"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Banner not found", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
))]
pub async fn get_user_banner(
    State(service): State<Arc<ApiBannerService>>,
    AuthExtractor(auth): AuthExtractor,
    Query(params): Query<UserBannerParams>,
) -> ApiResult<impl IntoResponse> {
    let banner = service
        .user_banner(params.tag_id, params.feature_id, params.use_last_revision)
        .await?;

    Ok(shape_banner_response(banner, auth.is_admin))
}

/// Admin bearers see the full record, everyone else only the content.
fn shape_banner_response(banner: Banner, is_admin: bool) -> Response {
    if is_admin {
        Json(banner).into_response()
    } else {
        Json(banner.content).into_response()
    }
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the user banner route router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/", axum::routing::get(get_user_banner))
}
