use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use super::CacheStore;
use crate::error::CacheError;

/// Translation cache stored in a PostgreSQL table.
///
/// Every key is namespaced with a prefix so several environments can share
/// one database.
#[derive(Debug, Clone)]
pub struct PgCache {
    pool: PgPool,
    prefix: String,
}

impl PgCache {
    /// Connect, then create the cache table if it does not exist.
    pub async fn connect(database_url: &str, prefix: impl Into<String>) -> Result<Self, CacheError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let cache = Self::from_pool(pool, prefix);
        cache.ensure_schema().await?;
        info!("Translation cache ready (prefix '{}')", cache.prefix);
        Ok(cache)
    }

    pub fn from_pool(pool: PgPool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), CacheError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS translation_cache (
                cache_key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn namespaced(&self, key: &str) -> String {
        namespaced_key(&self.prefix, key)
    }
}

fn namespaced_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", prefix, key)
    }
}

impl CacheStore for PgCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>> {
        async move {
            let value: Option<String> =
                sqlx::query_scalar("SELECT value FROM translation_cache WHERE cache_key = $1")
                    .bind(self.namespaced(key))
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(value)
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), CacheError>> {
        async move {
            sqlx::query(
                "INSERT INTO translation_cache (cache_key, value) VALUES ($1, $2)
                 ON CONFLICT (cache_key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
            )
            .bind(self.namespaced(key))
            .bind(value)
            .execute(&self.pool)
            .await?;
            Ok(())
        }
        .boxed()
    }
}
