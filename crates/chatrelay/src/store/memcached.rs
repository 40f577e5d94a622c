//! Memcached store on top of the `memcache` client.
//!
//! The client is blocking, so every call runs on the blocking pool. It is
//! created lazily and replaced after a failed call, so the store keeps
//! working across a server restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use memcache::{Client, MemcacheError};
use tokio::sync::Mutex;

use chatrelay_core::store::{Backend, KeyValueStore, Result, StoreError, StoreStats};

/// Longest key memcached accepts.
const MAX_KEY_LEN: usize = 250;

/// Attempts per call: the first on the cached client, one retry on a fresh
/// client after a failure.
const ATTEMPTS: usize = 2;

/// Seconds to wait for the TCP connect and for each read or write.
const CONNECT_TIMEOUT_SECS: u64 = 2;
const IO_TIMEOUT_SECS: u64 = 5;

/// Memcached backend.
pub struct MemcachedStore {
    url: String,
    client: Mutex<Option<Arc<Client>>>,
}

impl MemcachedStore {
    /// Connects to memcached and verifies it answers `version`.
    ///
    /// # Arguments
    ///
    /// * `addr` - `host:port` of the server (e.g., "localhost:11211"), or a
    ///   full `memcache://` URL
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if the server cannot be reached.
    pub async fn connect(addr: &str) -> Result<Self> {
        let store = Self {
            url: memcache_url(addr),
            client: Mutex::new(None),
        };
        let version = store.version().await?;
        tracing::debug!(%addr, %version, "Connected to memcached");
        Ok(store)
    }

    /// Returns the server version string.
    pub async fn version(&self) -> Result<String> {
        let versions = self.call(|client| client.version()).await?;
        versions
            .into_iter()
            .next()
            .map(|(_, version)| version)
            .ok_or_else(|| StoreError::Protocol("no version reported".to_string()))
    }

    async fn client(&self) -> Result<Arc<Client>> {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let url = self.url.clone();
        let client = tokio::task::spawn_blocking(move || Client::connect(url))
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let client = Arc::new(client);
        *guard = Some(client.clone());
        Ok(client)
    }

    async fn reset(&self) {
        *self.client.lock().await = None;
    }

    /// Runs `op` on the blocking pool, retrying once on a fresh client.
    async fn call<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: Fn(&Client) -> std::result::Result<T, MemcacheError> + Clone + Send + 'static,
    {
        let mut last_error = None;

        for _ in 0..ATTEMPTS {
            let client = self.client().await?;
            let op = op.clone();

            match tokio::task::spawn_blocking(move || op(&client)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => {
                    tracing::debug!(error = %err, "Memcached call failed, dropping client");
                    self.reset().await;
                    last_error = Some(StoreError::OperationFailed(err.to_string()));
                }
                Err(err) => return Err(StoreError::OperationFailed(err.to_string())),
            }
        }

        Err(last_error
            .unwrap_or_else(|| StoreError::ConnectionFailed("no connection".to_string())))
    }
}

#[async_trait]
impl KeyValueStore for MemcachedStore {
    fn backend(&self) -> Backend {
        Backend::Memcached
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let key = key.to_string();
        let value = value.to_string();
        self.call(move |client| client.set(&key, value.as_str(), 0))
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let key = key.to_string();
        // Raw bytes first: the response is fully read before it is decoded
        let raw = self
            .call(move |client| client.get::<Vec<u8>>(&key))
            .await?;
        decode_value(raw)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let servers = self.call(|client| client.stats()).await?;
        let stats = servers
            .into_iter()
            .next()
            .map(|(_, stats)| stats)
            .unwrap_or_default();
        Ok(stats_from_map(&stats))
    }
}

/// Builds the client URL from a bare `host:port`.
fn memcache_url(addr: &str) -> String {
    if addr.contains("://") {
        return addr.to_string();
    }
    format!(
        "memcache://{}?connect_timeout={}&timeout={}&tcp_nodelay=true",
        addr, CONNECT_TIMEOUT_SECS, IO_TIMEOUT_SECS
    )
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(StoreError::OperationFailed(format!(
            "key must be 1..={} bytes",
            MAX_KEY_LEN
        )));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(StoreError::OperationFailed(
            "key must not contain whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}

fn decode_value(raw: Option<Vec<u8>>) -> Result<Option<String>> {
    raw.map(|bytes| {
        String::from_utf8(bytes)
            .map_err(|_| StoreError::Protocol("value is not valid UTF-8".to_string()))
    })
    .transpose()
}

fn stats_from_map(stats: &HashMap<String, String>) -> StoreStats {
    let number = |name: &str| stats.get(name).and_then(|v| v.parse::<u64>().ok());
    StoreStats {
        backend: Backend::Memcached,
        connections: number("total_connections"),
        items: number("curr_items"),
        memory: stats.get("bytes").map(|bytes| format!("{} bytes", bytes)),
        uptime_secs: number("uptime"),
    }
}
