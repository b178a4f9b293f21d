//! Database Connection Pool and PostgreSQL Banner Gateway
//!
//! This module provides PostgreSQL connection pooling using deadpool-postgres
//! and the production implementation of the `BannerStore` gateway.
//!
//! Schema expectations: a `banners` table with `id BIGSERIAL`, `tag_ids
//! BIGINT[]`, `feature_id BIGINT`, `content JSONB`, `is_active BOOLEAN`, and
//! `created_at`/`updated_at TIMESTAMPTZ` columns.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use pennant_core::{
    Banner, BannerDraft, BannerId, FeatureId, Page, PennantResult, StorageError, TagId,
};
use pennant_storage::BannerStore;
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "pennant".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PENNANT_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("PENNANT_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("PENNANT_DB_NAME").unwrap_or_else(|_| "pennant".to_string()),
            user: std::env::var("PENNANT_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("PENNANT_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("PENNANT_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("PENNANT_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// POSTGRES BANNER GATEWAY
// ============================================================================

/// PostgreSQL-backed `BannerStore`.
#[derive(Clone)]
pub struct PgBannerStore {
    pool: Pool,
}

impl PgBannerStore {
    /// Create a new gateway with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new gateway from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Verify connectivity for readiness probes.
    pub async fn ping(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    async fn get_conn(&self) -> Result<deadpool_postgres::Object, StorageError> {
        self.pool.get().await.map_err(|e| StorageError::Unavailable {
            reason: e.to_string(),
        })
    }

    fn query_failed(e: tokio_postgres::Error) -> StorageError {
        tracing::error!("Banner query failed: {:?}", e);
        StorageError::QueryFailed {
            reason: e.to_string(),
        }
    }

    fn row_to_banner(row: &Row) -> Banner {
        let tag_ids: Vec<i64> = row.get("tag_ids");
        Banner {
            id: BannerId::new(row.get("id")),
            tag_ids: tag_ids.into_iter().map(TagId::new).collect(),
            feature_id: FeatureId::new(row.get("feature_id")),
            content: row.get("content"),
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl BannerStore for PgBannerStore {
    async fn get_banner(
        &self,
        tag_id: TagId,
        feature_id: FeatureId,
    ) -> PennantResult<Option<Banner>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                "SELECT id, tag_ids, feature_id, content, is_active, created_at, updated_at \
                 FROM banners \
                 WHERE $1 = ANY(tag_ids) AND feature_id = $2",
                &[&tag_id.as_i64(), &feature_id.as_i64()],
            )
            .await
            .map_err(Self::query_failed)?;

        Ok(row.as_ref().map(Self::row_to_banner))
    }

    async fn list_by_tag(&self, tag_id: TagId, page: Page) -> PennantResult<Vec<Banner>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT id, tag_ids, feature_id, content, is_active, created_at, updated_at \
                 FROM banners \
                 WHERE $1 = ANY(tag_ids) \
                 ORDER BY created_at LIMIT $2 OFFSET $3",
                &[&tag_id.as_i64(), &page.limit, &page.offset],
            )
            .await
            .map_err(Self::query_failed)?;

        Ok(rows.iter().map(Self::row_to_banner).collect())
    }

    async fn list_by_feature(
        &self,
        feature_id: FeatureId,
        page: Page,
    ) -> PennantResult<Vec<Banner>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT id, tag_ids, feature_id, content, is_active, created_at, updated_at \
                 FROM banners \
                 WHERE feature_id = $1 \
                 ORDER BY created_at LIMIT $2 OFFSET $3",
                &[&feature_id.as_i64(), &page.limit, &page.offset],
            )
            .await
            .map_err(Self::query_failed)?;

        Ok(rows.iter().map(Self::row_to_banner).collect())
    }

    async fn list_all(&self, page: Page) -> PennantResult<Vec<Banner>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT id, tag_ids, feature_id, content, is_active, created_at, updated_at \
                 FROM banners \
                 ORDER BY created_at LIMIT $1 OFFSET $2",
                &[&page.limit, &page.offset],
            )
            .await
            .map_err(Self::query_failed)?;

        Ok(rows.iter().map(Self::row_to_banner).collect())
    }

    async fn create_banner(&self, draft: &BannerDraft) -> PennantResult<BannerId> {
        let conn = self.get_conn().await?;

        let tag_ids: Vec<i64> = draft.tag_ids.iter().map(TagId::as_i64).collect();
        let row = conn
            .query_one(
                "INSERT INTO banners (tag_ids, feature_id, content, is_active, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, now(), now()) \
                 RETURNING id",
                &[
                    &tag_ids,
                    &draft.feature_id.as_i64(),
                    &draft.content,
                    &draft.is_active,
                ],
            )
            .await
            .map_err(Self::query_failed)?;

        Ok(BannerId::new(row.get(0)))
    }

    async fn update_banner(&self, id: BannerId, draft: &BannerDraft) -> PennantResult<bool> {
        let conn = self.get_conn().await?;

        let tag_ids: Vec<i64> = draft.tag_ids.iter().map(TagId::as_i64).collect();
        let rows_affected = conn
            .execute(
                "UPDATE banners \
                 SET tag_ids = $1, feature_id = $2, content = $3, is_active = $4, updated_at = now() \
                 WHERE id = $5",
                &[
                    &tag_ids,
                    &draft.feature_id.as_i64(),
                    &draft.content,
                    &draft.is_active,
                    &id.as_i64(),
                ],
            )
            .await
            .map_err(Self::query_failed)?;

        Ok(rows_affected != 0)
    }

    async fn delete_banner(&self, id: BannerId) -> PennantResult<bool> {
        let conn = self.get_conn().await?;

        let rows_affected = conn
            .execute("DELETE FROM banners WHERE id = $1", &[&id.as_i64()])
            .await
            .map_err(Self::query_failed)?;

        Ok(rows_affected != 0)
    }
}
