//! Filter and pagination types for banner list queries.

use serde::{Deserialize, Serialize};

use crate::banner::{FeatureId, TagId};

/// Filter for banner list queries.
///
/// `None` means "unspecified": the retrieval strategy is chosen from which
/// fields are present, with a concrete (tag, feature) pair taking precedence
/// over either single-field filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerFilter {
    pub tag_id: Option<TagId>,
    pub feature_id: Option<FeatureId>,
}

impl BannerFilter {
    /// Filter by a concrete (tag, feature) pair.
    pub fn by_pair(tag_id: TagId, feature_id: FeatureId) -> Self {
        Self {
            tag_id: Some(tag_id),
            feature_id: Some(feature_id),
        }
    }

    /// Filter by tag only.
    pub fn by_tag(tag_id: TagId) -> Self {
        Self {
            tag_id: Some(tag_id),
            feature_id: None,
        }
    }

    /// Filter by feature only.
    pub fn by_feature(feature_id: FeatureId) -> Self {
        Self {
            tag_id: None,
            feature_id: Some(feature_id),
        }
    }
}

/// Pagination window for list queries.
///
/// Applied by the store after filtering, never before. Defaults (limit=10,
/// offset=0) are the responsibility of the HTTP layer, not the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }
}
