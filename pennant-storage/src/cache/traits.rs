//! Cache backend trait.

use std::time::Duration;

use async_trait::async_trait;
use pennant_core::{Banner, PennantResult};

use super::key::BannerKey;

/// Expiring key-value cache for banners.
///
/// A miss is `Ok(None)`; `Err` is reserved for backend failures, and callers
/// must surface those rather than treating them as misses. Entries become
/// invisible once their TTL elapses - implementations are free to either
/// evict lazily or keep the expired bytes around, as long as reads never
/// return them.
#[async_trait]
pub trait BannerCache: Send + Sync {
    /// Look up a cached banner.
    async fn get(&self, key: &BannerKey) -> PennantResult<Option<Banner>>;

    /// Store a banner under `key`, expiring after `ttl`. Overwrites any
    /// existing entry and resets its deadline.
    async fn set(&self, key: &BannerKey, banner: &Banner, ttl: Duration) -> PennantResult<()>;
}
