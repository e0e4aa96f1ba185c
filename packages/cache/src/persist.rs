// ABOUTME: On-disk record format for snapshots
// ABOUTME: Versioned JSON holding the key segments, payload and fetch time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{CacheError, CacheResult},
    key::CacheKey,
};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedSnapshot {
    version: u32,
    key: Vec<String>,
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

impl PersistedSnapshot {
    pub fn new(key: &CacheKey, payload: Value, fetched_at: DateTime<Utc>) -> Self {
        Self {
            version: FORMAT_VERSION,
            key: key.segments(),
            payload,
            fetched_at,
        }
    }

    pub fn encode(&self) -> CacheResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a record stored under `storage_key` (prefix already stripped)
    pub fn decode(storage_key: &str, raw: &str) -> CacheResult<(CacheKey, Self)> {
        let snapshot: PersistedSnapshot =
            serde_json::from_str(raw).map_err(|e| CacheError::corrupt(storage_key, e))?;

        if snapshot.version != FORMAT_VERSION {
            return Err(CacheError::corrupt(
                storage_key,
                format!("unsupported format version {}", snapshot.version),
            ));
        }

        let key = CacheKey::from_segments(snapshot.key.clone())
            .ok_or_else(|| CacheError::corrupt(storage_key, "empty key"))?;
        if key.storage_key() != storage_key {
            return Err(CacheError::corrupt(
                storage_key,
                format!("record belongs to {}", key),
            ));
        }

        Ok((key, snapshot))
    }
}
