//! In-memory cache backend for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pennant_core::{Banner, CacheError, PennantResult};

use super::key::BannerKey;
use super::traits::BannerCache;

struct Entry {
    banner: Banner,
    expires_at: DateTime<Utc>,
}

/// HashMap-backed `BannerCache`.
///
/// Expired entries are evicted lazily on read.
#[derive(Default)]
pub struct MemoryBannerCache {
    entries: RwLock<HashMap<BannerKey, Entry>>,
}

impl MemoryBannerCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> CacheError {
        CacheError::Backend {
            reason: "cache lock poisoned".to_string(),
        }
    }

    /// Remove `key` only if its entry is still expired as of `now`.
    ///
    /// The deadline is re-checked under the write lock: a concurrent `set`
    /// may have refreshed the entry since the caller observed it expired,
    /// and that fresh entry must not be dropped.
    fn evict_if_expired(
        &self,
        key: &BannerKey,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_poisoned())?;
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        Ok(())
    }
}

#[async_trait]
impl BannerCache for MemoryBannerCache {
    async fn get(&self, key: &BannerKey) -> PennantResult<Option<Banner>> {
        let now = Utc::now();
        {
            let entries = self.entries.read().map_err(|_| Self::lock_poisoned())?;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    return Ok(Some(entry.banner.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: evict and report a miss
        self.evict_if_expired(key, now)?;
        Ok(None)
    }

    async fn set(&self, key: &BannerKey, banner: &Banner, ttl: Duration) -> PennantResult<()> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).map_err(|e| CacheError::Backend {
                reason: format!("TTL out of range: {e}"),
            })?;

        let mut entries = self.entries.write().map_err(|_| Self::lock_poisoned())?;
        entries.insert(
            key.clone(),
            Entry {
                banner: banner.clone(),
                expires_at,
            },
        );
        Ok(())
    }
}
