//! In-memory key-value store for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use chatrelay_core::store::{Backend, KeyValueStore, Result, StoreStats};

/// Process-local store. `clear` simulates a restart that loses data.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every stored value.
    pub async fn clear(&self) {
        self.data.write().await.clear();
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let items = self.data.read().await.len() as u64;
        Ok(StoreStats {
            items: Some(items),
            ..StoreStats::empty(Backend::Memory)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_clear() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.stats().await.unwrap().items, Some(1));

        store.clear().await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stats_render_as_memory_backend() {
        let store = MemoryStore::new();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.backend, Backend::Memory);
        assert!(chatrelay_core::store::format_store_stats(&stats).starts_with("⚪ Memory:"));
    }
}
