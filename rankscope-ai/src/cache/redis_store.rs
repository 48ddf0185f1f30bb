//! Shared cache store backed by a Redis server

use super::{CacheBackendKind, CacheError, CacheStore};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Per-operation deadline; an unreachable server must not stall a stage
const OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    op_timeout: Duration,
}

impl RedisStore {
    /// Validate the URL and build a client; no connection is made yet
    pub fn open(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Redis(e.to_string()))?;
        Ok(Self {
            client,
            op_timeout: OPERATION_TIMEOUT,
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, CacheError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))
    }

    async fn bounded<T, Fut>(&self, op: Fut) -> Result<T, CacheError>
    where
        Fut: Future<Output = Result<T, CacheError>>,
    {
        match timeout(self.op_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn kind(&self) -> CacheBackendKind {
        CacheBackendKind::Redis
    }

    async fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            conn.get(key)
                .await
                .map_err(|e| CacheError::Redis(e.to_string()))
        })
        .await
    }

    async fn write(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), CacheError> {
        let ttl_secs = ttl.as_secs().max(1);
        self.bounded(async {
            let mut conn = self.connection().await?;
            let _: () = conn
                .set_ex(key, payload, ttl_secs)
                .await
                .map_err(|e| CacheError::Redis(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let _: () = conn
                .del(key)
                .await
                .map_err(|e| CacheError::Redis(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn remove_all(&self) -> Result<(), CacheError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let _: () = redis::cmd("FLUSHDB")
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Redis(e.to_string()))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_malformed_url() {
        assert!(RedisStore::open("not a redis url").is_err());
    }

    #[test]
    fn test_open_does_not_connect() {
        // Nothing listens on this port; open must still succeed
        let store = RedisStore::open("redis://127.0.0.1:1/").unwrap();
        assert_eq!(store.kind(), CacheBackendKind::Redis);
    }
}
