//! Redis key-value store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use chatrelay_core::store::{Backend, KeyValueStore, Result, StoreError, StoreStats};

/// Redis backend sharing the broker's managed connection.
///
/// The connection manager reconnects on its own, so values written before a
/// server restart can be read back afterwards when persistence is enabled.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connects to Redis with its own managed connection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if the server does not answer `PING`.
    pub async fn connect(url: &str) -> Result<Self> {
        let connection_failed = |e: redis::RedisError| StoreError::ConnectionFailed(e.to_string());

        let client = redis::Client::open(url).map_err(connection_failed)?;

        // A plain connection fails fast; the manager would retry with backoff.
        let mut probe = client
            .get_multiplexed_async_connection()
            .await
            .map_err(connection_failed)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut probe)
            .await
            .map_err(connection_failed)?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(connection_failed)?;
        Ok(Self::new(conn))
    }
}

fn map_store_error(err: redis::RedisError) -> StoreError {
    if err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() {
        StoreError::ConnectionFailed(err.to_string())
    } else {
        StoreError::OperationFailed(err.to_string())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn backend(&self) -> Backend {
        Backend::Redis
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(map_store_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(map_store_error)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let mut conn = self.conn.clone();

        let info: redis::InfoDict = redis::cmd("INFO")
            .query_async(&mut conn)
            .await
            .map_err(map_store_error)?;
        let keys: u64 = redis::cmd("DBSIZE")
            .query_async(&mut conn)
            .await
            .map_err(map_store_error)?;

        Ok(StoreStats {
            backend: Backend::Redis,
            connections: info.get("connected_clients"),
            items: Some(keys),
            memory: info.get("used_memory_human"),
            uptime_secs: info.get("uptime_in_seconds"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::RedisBroker;

    /// Helper to get Redis URL from environment.
    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    /// Skip test if Redis not available.
    async fn get_test_store() -> Option<RedisStore> {
        let broker = RedisBroker::connect(&redis_url(), "").await.ok()?;
        Some(RedisStore::new(broker.connection()))
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let result = RedisStore::connect("redis://127.0.0.1:1").await;
        assert!(matches!(result, Err(StoreError::ConnectionFailed(_))));
    }

    #[test]
    fn test_refusal_maps_to_connection_failed() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = map_store_error(redis::RedisError::from(io));
        assert!(matches!(err, StoreError::ConnectionFailed(_)));
    }

    #[test]
    fn test_type_error_maps_to_operation_failed() {
        let err = redis::RedisError::from((redis::ErrorKind::TypeError, "bad type"));
        assert!(matches!(
            map_store_error(err),
            StoreError::OperationFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_redis_set_get() {
        let Some(store) = get_test_store().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let key = format!("test:{}", uuid::Uuid::new_v4());
        assert_eq!(store.get(&key).await.unwrap(), None);

        store.set(&key, "value").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_redis_stats() {
        let Some(store) = get_test_store().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.backend, Backend::Redis);
        assert!(stats.connections.unwrap_or(0) >= 1);
        assert!(stats.items.is_some());
        assert!(stats.memory.is_some());
        assert!(stats.uptime_secs.is_some());
    }
}
