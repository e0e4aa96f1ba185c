// ABOUTME: Durable string key/value storage contract
// ABOUTME: Process-wide surface shared by every cache writer; last writer wins per key

use async_trait::async_trait;

use crate::StorageResult;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or overwrite
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Returns whether a value was present
    async fn remove(&self, key: &str) -> StorageResult<bool>;

    /// All pairs whose key starts with `prefix`, ordered by key
    async fn entries_with_prefix(&self, prefix: &str) -> StorageResult<Vec<(String, String)>>;

    /// Remove every key starting with `prefix`; returns the number removed
    async fn clear_prefix(&self, prefix: &str) -> StorageResult<u64>;
}
