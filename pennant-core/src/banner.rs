//! Banner entity and identifier types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Storage-assigned banner identifier (BIGSERIAL in PostgreSQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct BannerId(i64);

impl BannerId {
    /// Wrap a raw storage identifier.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BannerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag identifier. Half of the (tag, feature) targeting key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct TagId(i64);

impl TagId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Feature identifier. The other half of the (tag, feature) targeting key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct FeatureId(i64);

impl FeatureId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A versioned content record associated with a set of tags and one feature.
///
/// `content` is an opaque consumer-defined document; nothing in the service
/// validates or inspects it. `is_active` is a visibility flag filtered on by
/// collaborators, not by the read path itself.
///
/// Invariant (assumed, enforced at the storage layer): for any given
/// (tag, feature) pair there is at most one current banner visible to the
/// user-facing read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Banner {
    /// Storage-assigned identity, immutable once created.
    #[serde(rename = "banner_id")]
    pub id: BannerId,
    /// Non-empty set of tags this record applies to.
    pub tag_ids: Vec<TagId>,
    /// The single feature this record belongs to.
    pub feature_id: FeatureId,
    /// Opaque structured document shown to end users.
    pub content: serde_json::Value,
    /// Visibility flag.
    pub is_active: bool,
    /// Store-assigned creation timestamp. List ordering key.
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub created_at: Timestamp,
    /// Store-assigned last-modification timestamp.
    #[cfg_attr(feature = "openapi", schema(value_type = DateTime<Utc>))]
    pub updated_at: Timestamp,
}

/// The caller-supplied portion of a banner, used by create and update.
///
/// Identity and timestamps are store-assigned and therefore absent here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BannerDraft {
    pub tag_ids: Vec<TagId>,
    pub feature_id: FeatureId,
    pub content: serde_json::Value,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_banner() -> Banner {
        Banner {
            id: BannerId::new(10),
            tag_ids: vec![TagId::new(5)],
            feature_id: FeatureId::new(2),
            content: json!({"x": 1}),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_banner_serializes_id_as_banner_id() {
        let banner = sample_banner();
        let value = serde_json::to_value(&banner).unwrap();
        assert_eq!(value["banner_id"], json!(10));
        assert_eq!(value["tag_ids"], json!([5]));
        assert_eq!(value["feature_id"], json!(2));
        assert_eq!(value["is_active"], json!(true));
    }

    #[test]
    fn test_banner_roundtrip() {
        let banner = sample_banner();
        let encoded = serde_json::to_string(&banner).unwrap();
        let decoded: Banner = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, banner);
    }

    #[test]
    fn test_ids_are_transparent() {
        assert_eq!(serde_json::to_value(TagId::new(7)).unwrap(), json!(7));
        let id: FeatureId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(id.as_i64(), 42);
    }

    #[test]
    fn test_draft_roundtrip() {
        let draft = BannerDraft {
            tag_ids: vec![TagId::new(1), TagId::new(2)],
            feature_id: FeatureId::new(3),
            content: json!({"title": "hello"}),
            is_active: false,
        };
        let encoded = serde_json::to_string(&draft).unwrap();
        let decoded: BannerDraft = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, draft);
    }
}
