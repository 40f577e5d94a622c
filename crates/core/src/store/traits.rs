use async_trait::async_trait;

use super::{Backend, Result, StoreStats};

/// Trait for the simple key-value operations used by the persistence demo
/// and `/stats`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Which backend this store talks to.
    fn backend(&self) -> Backend;

    /// Stores a string value under `key` without expiry.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Collects server statistics.
    async fn stats(&self) -> Result<StoreStats>;
}
