//! Banner read/write service.
//!
//! `BannerService` mediates between the durable [`BannerStore`] and the
//! expiring [`BannerCache`]. The user-facing read follows the cache-aside
//! pattern: check the cache, fall back to storage on a miss, then repopulate
//! best-effort. Administrative reads and all writes go straight to storage;
//! writes do NOT invalidate the cache, so a cached copy may serve stale for
//! up to one TTL after an update or delete.

use std::sync::Arc;
use std::time::Duration;

use pennant_core::{
    Banner, BannerDraft, BannerFilter, BannerId, FeatureId, Page, PennantResult, StorageError,
    TagId,
};
use tracing::warn;

use crate::cache::{BannerCache, BannerKey};
use crate::BannerStore;

/// Default lifetime of a cached banner.
const DEFAULT_BANNER_TTL: Duration = Duration::from_secs(300);

/// Tuning knobs for [`BannerService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// TTL applied to every cache population.
    pub banner_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            banner_ttl: DEFAULT_BANNER_TTL,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_banner_ttl(mut self, ttl: Duration) -> Self {
        self.banner_ttl = ttl;
        self
    }
}

/// The banner service: cache-aside reads, pass-through queries and writes.
pub struct BannerService<S, C> {
    storage: Arc<S>,
    cache: Arc<C>,
    config: ServiceConfig,
}

impl<S, C> BannerService<S, C>
where
    S: BannerStore,
    C: BannerCache,
{
    pub fn new(storage: Arc<S>, cache: Arc<C>, config: ServiceConfig) -> Self {
        Self {
            storage,
            cache,
            config,
        }
    }

    /// The user-facing single-banner read.
    ///
    /// With `use_last_revision` unset, a cached copy is served when present;
    /// otherwise storage is consulted and the result cached best-effort.
    /// With it set, the cache read is skipped so the caller observes the
    /// current stored revision, but the entry is still repopulated - a
    /// freshness-bypass read refreshes the cache for everyone else.
    ///
    /// Errors: [`StorageError::NotFound`] when no banner targets the pair;
    /// cache backend failures are surfaced, not masked as misses.
    pub async fn user_banner(
        &self,
        tag_id: TagId,
        feature_id: FeatureId,
        use_last_revision: bool,
    ) -> PennantResult<Banner> {
        let key = BannerKey::derive(tag_id, feature_id);

        if !use_last_revision {
            if let Some(banner) = self.cache.get(&key).await? {
                return Ok(banner);
            }
        }

        let banner = self
            .storage
            .get_banner(tag_id, feature_id)
            .await?
            .ok_or(StorageError::NotFound)?;

        // Best-effort repopulation: a cache write failure must not fail a
        // read that storage already answered.
        if let Err(error) = self
            .cache
            .set(&key, &banner, self.config.banner_ttl)
            .await
        {
            warn!(%tag_id, %feature_id, %error, "failed to cache banner");
        }

        Ok(banner)
    }

    /// The administrative list query. Never touches the cache.
    ///
    /// The retrieval strategy follows the filter: a full (tag, feature) pair
    /// is a point lookup returned as a zero-or-one element list, a single
    /// field narrows to that field, no filter lists everything. Pagination
    /// applies after filtering in every branch.
    pub async fn list_banners(
        &self,
        filter: BannerFilter,
        page: Page,
    ) -> PennantResult<Vec<Banner>> {
        match (filter.tag_id, filter.feature_id) {
            (Some(tag_id), Some(feature_id)) => {
                let banner = self.storage.get_banner(tag_id, feature_id).await?;
                Ok(banner.into_iter().collect())
            }
            (Some(tag_id), None) => self.storage.list_by_tag(tag_id, page).await,
            (None, Some(feature_id)) => self.storage.list_by_feature(feature_id, page).await,
            (None, None) => self.storage.list_all(page).await,
        }
    }

    /// Create a banner, returning its storage-assigned id.
    pub async fn create_banner(&self, draft: &BannerDraft) -> PennantResult<BannerId> {
        self.storage.create_banner(draft).await
    }

    /// Update a banner. `Ok(false)` means no banner with that id exists.
    ///
    /// The cache is deliberately left alone: a previously cached copy keeps
    /// serving until its TTL lapses.
    pub async fn update_banner(&self, id: BannerId, draft: &BannerDraft) -> PennantResult<bool> {
        self.storage.update_banner(id, draft).await
    }

    /// Delete a banner. `Ok(false)` means no banner with that id exists.
    pub async fn delete_banner(&self, id: BannerId) -> PennantResult<bool> {
        self.storage.delete_banner(id).await
    }
}

// =============================================================================
// TESTS
// =============================================================================
