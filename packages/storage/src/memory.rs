// ABOUTME: Volatile key/value store for tests and ephemeral sessions
// ABOUTME: Same contract as the SQLite store, backed by an ordered map

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{KeyValueStore, StorageResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        Ok(self.values.write().await.remove(key).is_some())
    }

    async fn entries_with_prefix(&self, prefix: &str) -> StorageResult<Vec<(String, String)>> {
        Ok(self
            .values
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn clear_prefix(&self, prefix: &str) -> StorageResult<u64> {
        let mut values = self.values.write().await;
        let before = values.len();
        values.retain(|k, _| !k.starts_with(prefix));
        Ok((before - values.len()) as u64)
    }
}
