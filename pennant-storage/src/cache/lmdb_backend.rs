//! LMDB-backed cache implementation.
//!
//! Uses the heed crate (Rust bindings for LMDB) as a memory-mapped key-value
//! store. Keys are the hex form of [`BannerKey`]; values carry the expiry
//! deadline inline so that TTLs survive process restarts:
//!
//! ```text
//! [expires_at millis: 8 bytes LE][banner as JSON]
//! ```
//!
//! Expired entries read as misses and are evicted lazily on the next read.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use pennant_core::{Banner, CacheError, PennantResult};

use super::key::BannerKey;
use super::traits::BannerCache;

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for pennant_core::PennantError {
    fn from(e: LmdbCacheError) -> Self {
        let cache_error = match e {
            LmdbCacheError::Serialization(reason) | LmdbCacheError::Deserialization(reason) => {
                CacheError::Serialization { reason }
            }
            other => CacheError::Backend {
                reason: other.to_string(),
            },
        };
        pennant_core::PennantError::Cache(cache_error)
    }
}

/// LMDB-backed `BannerCache`.
pub struct LmdbBannerCache {
    env: Env,
    db: Database<Str, Bytes>,
}

impl LmdbBannerCache {
    /// Open (or create) an LMDB environment at `path`.
    ///
    /// `max_size_mb` bounds the memory map; LMDB refuses writes beyond it.
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        let db: Database<Str, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }

    /// Remove `key` only if its entry is still expired as of `now_millis`.
    ///
    /// The deadline is re-read inside the write transaction: a concurrent
    /// `set` may have refreshed the entry since the reader observed it
    /// expired, and that fresh entry must not be dropped.
    fn evict_if_expired(&self, key: &BannerKey, now_millis: i64) -> Result<(), LmdbCacheError> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        let still_expired = match self
            .db
            .get(&wtxn, key.as_str())
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?
        {
            Some(bytes) => match deadline_millis(bytes) {
                Some(expires_at_millis) => expires_at_millis <= now_millis,
                // Malformed entries are evictable regardless of deadline
                None => true,
            },
            None => false,
        };

        if still_expired {
            self.db
                .delete(&mut wtxn, key.as_str())
                .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
        }

        wtxn.commit()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        Ok(())
    }
}

/// Parse the 8-byte little-endian deadline prefix, if present.
fn deadline_millis(bytes: &[u8]) -> Option<i64> {
    let prefix: [u8; 8] = bytes.get(0..8)?.try_into().ok()?;
    Some(i64::from_le_bytes(prefix))
}

#[async_trait]
impl BannerCache for LmdbBannerCache {
    async fn get(&self, key: &BannerKey) -> PennantResult<Option<Banner>> {
        let now_millis = Utc::now().timestamp_millis();
        let expired = {
            let rtxn = self
                .env
                .read_txn()
                .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

            match self
                .db
                .get(&rtxn, key.as_str())
                .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?
            {
                Some(bytes) => {
                    let expires_at_millis = deadline_millis(bytes).ok_or_else(|| {
                        LmdbCacheError::Deserialization(
                            "entry shorter than deadline prefix".into(),
                        )
                    })?;

                    if expires_at_millis > now_millis {
                        let banner: Banner = serde_json::from_slice(&bytes[8..])
                            .map_err(|e| LmdbCacheError::Deserialization(e.to_string()))?;
                        return Ok(Some(banner));
                    }
                    true
                }
                None => false,
            }
        };

        if expired {
            self.evict_if_expired(key, now_millis)?;
        }
        Ok(None)
    }

    async fn set(&self, key: &BannerKey, banner: &Banner, ttl: Duration) -> PennantResult<()> {
        let ttl_millis = i64::try_from(ttl.as_millis())
            .map_err(|_| LmdbCacheError::Serialization("TTL out of range".into()))?;
        let expires_at_millis = Utc::now()
            .timestamp_millis()
            .saturating_add(ttl_millis);

        let value_bytes = serde_json::to_vec(banner)
            .map_err(|e| LmdbCacheError::Serialization(e.to_string()))?;

        let mut full_bytes = Vec::with_capacity(8 + value_bytes.len());
        full_bytes.extend_from_slice(&expires_at_millis.to_le_bytes());
        full_bytes.extend_from_slice(&value_bytes);

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        self.db
            .put(&mut wtxn, key.as_str(), &full_bytes)
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        Ok(())
    }
}
