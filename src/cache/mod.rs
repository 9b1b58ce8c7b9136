//! Redis-backed cache for analytics reads.
//!
//! Keys embed a generation number stored under `analytics:version`. Any write
//! that changes issue aggregates bumps the generation, which orphans every
//! cached entry at once; orphans expire through their TTL.

use redis::AsyncCommands;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::AppError;

pub const VERSION_KEY: &str = "analytics:version";

#[derive(Clone)]
pub struct AnalyticsCache {
    client: redis::Client,
    ttl_secs: u64,
}

impl AnalyticsCache {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    async fn version(&self, conn: &mut redis::aio::MultiplexedConnection) -> Result<i64, AppError> {
        let version: Option<i64> = conn.get(VERSION_KEY).await?;
        Ok(version.unwrap_or(0))
    }

    pub async fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        let mut conn = self.connection().await?;
        let key = versioned_key(self.version(&mut conn).await?, name);
        let raw: Option<String> = conn.get(&key).await?;

        match raw {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, name: &str, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Failed to serialize cache entry: {}", e)))?;
        let mut conn = self.connection().await?;
        let key = versioned_key(self.version(&mut conn).await?, name);
        let _: () = conn.set_ex(&key, json, self.ttl_secs).await?;
        Ok(())
    }

    pub async fn invalidate(&self) -> Result<i64, AppError> {
        let mut conn = self.connection().await?;
        let version: i64 = conn.incr(VERSION_KEY, 1).await?;
        Ok(version)
    }

    /// Returns the cached value or computes and stores it. Cache failures are
    /// logged and fall through to `compute`.
    pub async fn get_or_compute<T, F>(&self, name: &str, compute: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, AppError>,
    {
        match self.get::<T>(name).await {
            Ok(Some(hit)) => {
                tracing::debug!(cache_key = name, "Analytics cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(cache_key = name, error = %e, "Analytics cache read failed"),
        }

        let value = compute()?;
        if let Err(e) = self.set(name, &value).await {
            tracing::warn!(cache_key = name, error = %e, "Analytics cache write failed");
        }
        Ok(value)
    }

    /// Bumps the generation, logging instead of failing.
    pub async fn invalidate_best_effort(&self) {
        if let Err(e) = self.invalidate().await {
            tracing::warn!(error = %e, "Failed to invalidate analytics cache");
        }
    }
}

pub fn versioned_key(version: i64, name: &str) -> String {
    format!("analytics:v{}:{}", version, name)
}

pub fn summary_key(days: i64) -> String {
    format!("summary:{}", days)
}

pub fn officers_key() -> &'static str {
    "officers"
}
