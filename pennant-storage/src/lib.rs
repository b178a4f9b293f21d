//! Pennant Storage - Gateway Traits and In-Memory Implementations
//!
//! Defines the storage and cache abstraction layer for banners, plus the
//! `BannerService` that mediates between the two. The PostgreSQL
//! implementation lives in pennant-api.

pub mod cache;
pub mod service;

// Re-export cache types for API integration
pub use cache::{
    BannerCache, BannerKey, LmdbBannerCache, LmdbCacheError, MemoryBannerCache,
};
pub use service::{BannerService, ServiceConfig};

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use pennant_core::{
    Banner, BannerDraft, BannerId, FeatureId, Page, PennantResult, StorageError, TagId,
};

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Durable record store for banners.
///
/// Implementations provide persistence and are the single source of truth;
/// cached copies are always subordinate to what these operations return.
/// All list operations order by creation time ascending and apply the
/// pagination window after filtering.
#[async_trait]
pub trait BannerStore: Send + Sync {
    /// Point lookup for the unique banner targeting a (tag, feature) pair.
    ///
    /// Returns `Ok(None)` when no record matches; errors are reserved for
    /// storage failures.
    async fn get_banner(
        &self,
        tag_id: TagId,
        feature_id: FeatureId,
    ) -> PennantResult<Option<Banner>>;

    /// List banners whose tag set contains `tag_id`.
    async fn list_by_tag(&self, tag_id: TagId, page: Page) -> PennantResult<Vec<Banner>>;

    /// List banners belonging to `feature_id`.
    async fn list_by_feature(
        &self,
        feature_id: FeatureId,
        page: Page,
    ) -> PennantResult<Vec<Banner>>;

    /// List all banners.
    async fn list_all(&self, page: Page) -> PennantResult<Vec<Banner>>;

    /// Insert a new banner and return its storage-assigned id.
    async fn create_banner(&self, draft: &BannerDraft) -> PennantResult<BannerId>;

    /// Replace the caller-supplied fields of an existing banner.
    ///
    /// Returns `Ok(false)` when no record with that id exists - distinct
    /// from an error.
    async fn update_banner(&self, id: BannerId, draft: &BannerDraft) -> PennantResult<bool>;

    /// Delete a banner. `Ok(false)` means no matching record.
    async fn delete_banner(&self, id: BannerId) -> PennantResult<bool>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory `BannerStore` for tests and local development.
///
/// Assigns ids and timestamps the way the real store does, and mirrors its
/// ordering contract: lists are sorted by creation time ascending.
#[derive(Default)]
pub struct MemoryBannerStore {
    banners: RwLock<Vec<Banner>>,
    next_id: AtomicI64,
}

impl MemoryBannerStore {
    pub fn new() -> Self {
        Self {
            banners: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn lock_poisoned() -> StorageError {
        StorageError::Unavailable {
            reason: "store lock poisoned".to_string(),
        }
    }

    fn paginate(mut banners: Vec<Banner>, page: Page) -> Vec<Banner> {
        banners.sort_by_key(|b| b.created_at);
        banners
            .into_iter()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .collect()
    }
}

#[async_trait]
impl BannerStore for MemoryBannerStore {
    async fn get_banner(
        &self,
        tag_id: TagId,
        feature_id: FeatureId,
    ) -> PennantResult<Option<Banner>> {
        let banners = self.banners.read().map_err(|_| Self::lock_poisoned())?;
        Ok(banners
            .iter()
            .find(|b| b.feature_id == feature_id && b.tag_ids.contains(&tag_id))
            .cloned())
    }

    async fn list_by_tag(&self, tag_id: TagId, page: Page) -> PennantResult<Vec<Banner>> {
        let banners = self.banners.read().map_err(|_| Self::lock_poisoned())?;
        let matching: Vec<Banner> = banners
            .iter()
            .filter(|b| b.tag_ids.contains(&tag_id))
            .cloned()
            .collect();
        Ok(Self::paginate(matching, page))
    }

    async fn list_by_feature(
        &self,
        feature_id: FeatureId,
        page: Page,
    ) -> PennantResult<Vec<Banner>> {
        let banners = self.banners.read().map_err(|_| Self::lock_poisoned())?;
        let matching: Vec<Banner> = banners
            .iter()
            .filter(|b| b.feature_id == feature_id)
            .cloned()
            .collect();
        Ok(Self::paginate(matching, page))
    }

    async fn list_all(&self, page: Page) -> PennantResult<Vec<Banner>> {
        let banners = self.banners.read().map_err(|_| Self::lock_poisoned())?;
        Ok(Self::paginate(banners.clone(), page))
    }

    async fn create_banner(&self, draft: &BannerDraft) -> PennantResult<BannerId> {
        let id = BannerId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let banner = Banner {
            id,
            tag_ids: draft.tag_ids.clone(),
            feature_id: draft.feature_id,
            content: draft.content.clone(),
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        };

        let mut banners = self.banners.write().map_err(|_| Self::lock_poisoned())?;
        banners.push(banner);
        Ok(id)
    }

    async fn update_banner(&self, id: BannerId, draft: &BannerDraft) -> PennantResult<bool> {
        let mut banners = self.banners.write().map_err(|_| Self::lock_poisoned())?;
        match banners.iter_mut().find(|b| b.id == id) {
            Some(banner) => {
                banner.tag_ids = draft.tag_ids.clone();
                banner.feature_id = draft.feature_id;
                banner.content = draft.content.clone();
                banner.is_active = draft.is_active;
                banner.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_banner(&self, id: BannerId) -> PennantResult<bool> {
        let mut banners = self.banners.write().map_err(|_| Self::lock_poisoned())?;
        let before = banners.len();
        banners.retain(|b| b.id != id);
        Ok(banners.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(tags: &[i64], feature: i64) -> BannerDraft {
        BannerDraft {
            tag_ids: tags.iter().copied().map(TagId::new).collect(),
            feature_id: FeatureId::new(feature),
            content: json!({"feature": feature}),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = MemoryBannerStore::new();
        let a = store.create_banner(&draft(&[1], 1)).await.unwrap();
        let b = store.create_banner(&draft(&[2], 2)).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_point_lookup_requires_both_tag_and_feature() {
        let store = MemoryBannerStore::new();
        store.create_banner(&draft(&[5, 6], 2)).await.unwrap();

        let hit = store
            .get_banner(TagId::new(5), FeatureId::new(2))
            .await
            .unwrap();
        assert!(hit.is_some());

        // Right tag, wrong feature
        let miss = store
            .get_banner(TagId::new(5), FeatureId::new(3))
            .await
            .unwrap();
        assert!(miss.is_none());

        // Right feature, wrong tag
        let miss = store
            .get_banner(TagId::new(7), FeatureId::new(2))
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_lists_are_ordered_by_creation_time() {
        let store = MemoryBannerStore::new();
        let first = store.create_banner(&draft(&[1], 10)).await.unwrap();
        let second = store.create_banner(&draft(&[1], 11)).await.unwrap();
        let third = store.create_banner(&draft(&[1], 12)).await.unwrap();

        let listed = store
            .list_by_tag(TagId::new(1), Page::new(100, 0))
            .await
            .unwrap();
        let ids: Vec<BannerId> = listed.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![first, second, third]);
    }

    #[tokio::test]
    async fn test_pagination_window_after_filtering() {
        let store = MemoryBannerStore::new();
        for i in 0..5 {
            store.create_banner(&draft(&[1], i)).await.unwrap();
        }
        // A record that must not count against the offset for tag 1
        store.create_banner(&draft(&[2], 99)).await.unwrap();

        let window = store
            .list_by_tag(TagId::new(1), Page::new(2, 1))
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].feature_id, FeatureId::new(1));
        assert_eq!(window[1].feature_id, FeatureId::new(2));
    }

    #[tokio::test]
    async fn test_list_by_feature() {
        let store = MemoryBannerStore::new();
        store.create_banner(&draft(&[1], 7)).await.unwrap();
        store.create_banner(&draft(&[2], 7)).await.unwrap();
        store.create_banner(&draft(&[3], 8)).await.unwrap();

        let listed = store
            .list_by_feature(FeatureId::new(7), Page::new(10, 0))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|b| b.feature_id == FeatureId::new(7)));
    }

    #[tokio::test]
    async fn test_list_all_respects_limit() {
        let store = MemoryBannerStore::new();
        for i in 0..4 {
            store.create_banner(&draft(&[i], i)).await.unwrap();
        }
        let listed = store.list_all(Page::new(3, 0)).await.unwrap();
        assert_eq!(listed.len(), 3);
    }

    #[tokio::test]
    async fn test_update_applied_flag() {
        let store = MemoryBannerStore::new();
        let id = store.create_banner(&draft(&[1], 1)).await.unwrap();

        let mut updated = draft(&[1, 2], 1);
        updated.content = json!({"v": 2});
        assert!(store.update_banner(id, &updated).await.unwrap());

        let banner = store
            .get_banner(TagId::new(2), FeatureId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(banner.content, json!({"v": 2}));

        // Unknown id is not an error
        let missing = BannerId::new(9999);
        assert!(!store.update_banner(missing, &updated).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_applied_flag() {
        let store = MemoryBannerStore::new();
        let id = store.create_banner(&draft(&[1], 1)).await.unwrap();

        assert!(store.delete_banner(id).await.unwrap());
        assert!(!store.delete_banner(id).await.unwrap());
        assert!(store
            .get_banner(TagId::new(1), FeatureId::new(1))
            .await
            .unwrap()
            .is_none());
    }
}
