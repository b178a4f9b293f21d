//! Banner Management REST API Routes
//!
//! This module implements the administrative CRUD surface for banners.
//! All handlers go through the cache-aside `BannerService`; writes are
//! storage pass-throughs and deliberately leave cached entries in place
//! until their TTL lapses.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pennant_core::{BannerFilter, BannerId, Page};

use crate::{
    error::{ApiError, ApiResult},
    state::{ApiBannerService, AppState},
    types::{BannerRequest, CreateBannerResponse, ListBannersParams},
};

// ============================================================================
// VALIDATION
// ============================================================================

fn validate_banner_request(request: &BannerRequest) -> ApiResult<()> {
    if request.tag_ids.is_empty() {
        return Err(ApiError::invalid_input(
            "Banner must apply to at least one tag",
        ));
    }
    Ok(())
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /banner - List banners, optionally filtered by tag and/or feature
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/banner",
    tag = "Banners",
    params(ListBannersParams),
    responses(
        (status = 200, description = "Banners matching the filter"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
))]
pub async fn list_banners(
    State(service): State<Arc<ApiBannerService>>,
    Query(params): Query<ListBannersParams>,
) -> ApiResult<impl IntoResponse> {
    let filter = BannerFilter {
        tag_id: params.tag_id,
        feature_id: params.feature_id,
    };
    let page = Page::new(params.limit(), params.offset());

    let banners = service.list_banners(filter, page).await?;
    Ok(Json(banners))
}

/// POST /banner - Create a new banner
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/banner",
    tag = "Banners",
    request_body = BannerRequest,
    responses(
        (status = 201, description = "Banner created", body = CreateBannerResponse),
        (status = 400, description = "Invalid banner", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
))]
pub async fn create_banner(
    State(service): State<Arc<ApiBannerService>>,
    Json(request): Json<BannerRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_banner_request(&request)?;

    let banner_id = service.create_banner(&request.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(CreateBannerResponse { banner_id })))
}

/// PATCH /banner/{id} - Replace the stored revision of a banner
#[cfg_attr(feature = "openapi", utoipa::path(
    patch,
    path = "/banner/{id}",
    tag = "Banners",
    params(
        ("id" = i64, Path, description = "Banner ID")
    ),
    request_body = BannerRequest,
    responses(
        (status = 200, description = "Banner updated"),
        (status = 400, description = "Invalid banner", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "Banner not found", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
))]
pub async fn update_banner(
    State(service): State<Arc<ApiBannerService>>,
    Path(id): Path<i64>,
    Json(request): Json<BannerRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_banner_request(&request)?;

    let applied = service
        .update_banner(BannerId::new(id), &request.into_draft())
        .await?;
    if !applied {
        return Err(ApiError::banner_not_found().with_details(serde_json::json!({ "id": id })));
    }
    Ok(StatusCode::OK)
}

/// DELETE /banner/{id} - Delete a banner
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/banner/{id}",
    tag = "Banners",
    params(
        ("id" = i64, Path, description = "Banner ID")
    ),
    responses(
        (status = 204, description = "Banner deleted"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin access required", body = ApiError),
        (status = 404, description = "Banner not found", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
))]
pub async fn delete_banner(
    State(service): State<Arc<ApiBannerService>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let applied = service.delete_banner(BannerId::new(id)).await?;
    if !applied {
        return Err(ApiError::banner_not_found().with_details(serde_json::json!({ "id": id })));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the banner management router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/",
            axum::routing::get(list_banners).post(create_banner),
        )
        .route(
            "/:id",
            axum::routing::patch(update_banner).delete(delete_banner),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pennant_core::{FeatureId, TagId};
    use serde_json::json;

    fn valid_request() -> BannerRequest {
        BannerRequest {
            tag_ids: vec![TagId::new(1)],
            feature_id: FeatureId::new(2),
            content: json!({"title": "sale"}),
            is_active: true,
        }
    }

    #[test]
    fn test_validate_accepts_tagged_banner() {
        assert!(validate_banner_request(&valid_request()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_tags() {
        let mut request = valid_request();
        request.tag_ids.clear();

        let err = validate_banner_request(&request).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
    }

    #[test]
    fn test_create_response_serializes_banner_id() -> Result<(), serde_json::Error> {
        let response = CreateBannerResponse {
            banner_id: BannerId::new(42),
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(value, json!({"banner_id": 42}));
        Ok(())
    }
}
