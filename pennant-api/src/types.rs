//! Request and response types for the banner routes.

use pennant_core::{BannerDraft, BannerId, FeatureId, TagId};
use serde::{Deserialize, Serialize};

/// Default page size when the caller omits `limit`.
pub const DEFAULT_LIMIT: i64 = 10;

/// Default page start when the caller omits `offset`.
pub const DEFAULT_OFFSET: i64 = 0;

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

/// Query parameters for the user-facing banner read.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct UserBannerParams {
    /// Tag the requesting user belongs to.
    pub tag_id: TagId,
    /// Feature whose banner is requested.
    pub feature_id: FeatureId,
    /// Skip the cache read and observe the current stored revision.
    #[serde(default)]
    pub use_last_revision: bool,
}

/// Query parameters for the administrative banner list.
///
/// All fields are optional; which ones are present selects the retrieval
/// strategy. Pagination defaults are applied here at the HTTP boundary.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ListBannersParams {
    /// Restrict to banners carrying this tag.
    pub tag_id: Option<TagId>,
    /// Restrict to banners of this feature.
    pub feature_id: Option<FeatureId>,
    /// Page size (default 10).
    pub limit: Option<i64>,
    /// Page start (default 0).
    pub offset: Option<i64>,
}

impl ListBannersParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(DEFAULT_OFFSET)
    }
}

// ============================================================================
// REQUEST / RESPONSE BODIES
// ============================================================================

/// Request body for creating or updating a banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BannerRequest {
    /// Tags this banner applies to. Must be non-empty.
    pub tag_ids: Vec<TagId>,
    /// Feature this banner belongs to.
    pub feature_id: FeatureId,
    /// Opaque structured document shown to end users.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub content: serde_json::Value,
    /// Visibility flag.
    pub is_active: bool,
}

impl BannerRequest {
    /// Convert into the service-level draft.
    pub fn into_draft(self) -> BannerDraft {
        BannerDraft {
            tag_ids: self.tag_ids,
            feature_id: self.feature_id,
            content: self.content,
            is_active: self.is_active,
        }
    }
}

/// Response body for banner creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateBannerResponse {
    /// Storage-assigned identifier of the new banner.
    pub banner_id: BannerId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_banner_params_default_revision_flag() {
        let params: UserBannerParams =
            serde_json::from_value(json!({"tag_id": 1, "feature_id": 2})).unwrap();
        assert!(!params.use_last_revision);
        assert_eq!(params.tag_id, TagId::new(1));
    }

    #[test]
    fn test_list_params_pagination_defaults() {
        let params = ListBannersParams::default();
        assert_eq!(params.limit(), DEFAULT_LIMIT);
        assert_eq!(params.offset(), DEFAULT_OFFSET);

        let params: ListBannersParams =
            serde_json::from_value(json!({"limit": 50, "offset": 20})).unwrap();
        assert_eq!(params.limit(), 50);
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn test_banner_request_into_draft() {
        let request = BannerRequest {
            tag_ids: vec![TagId::new(1), TagId::new(2)],
            feature_id: FeatureId::new(3),
            content: json!({"title": "hi"}),
            is_active: true,
        };

        let draft = request.into_draft();
        assert_eq!(draft.tag_ids.len(), 2);
        assert_eq!(draft.feature_id, FeatureId::new(3));
        assert!(draft.is_active);
    }
}
