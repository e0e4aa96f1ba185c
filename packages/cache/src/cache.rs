// ABOUTME: Snapshot cache keyed by resource and parameters
// ABOUTME: Refreshes only on request, guards one fetch per key and persists successes

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use cloudlens_storage::KeyValueStore;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    entry::{CacheEntry, EntryStatus, RefreshError},
    error::CacheResult,
    key::CacheKey,
    persist::PersistedSnapshot,
};

pub const DEFAULT_PREFIX: &str = "cloudlens.snapshot:";
pub const DEFAULT_RETENTION_DAYS: i64 = 365;

/// Result of a `refresh` call
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// New payload stored (and persisted when storage accepted it)
    Updated,
    /// Fetch failed; the previous payload is untouched
    Failed(RefreshError),
    /// An interactive login took over; nothing recorded
    Abandoned,
    /// Another refresh of the same key is running
    AlreadyInFlight,
    /// The entry was cleared or removed while the fetch ran
    Discarded,
}

/// Counts from a `rehydrate` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RehydrateReport {
    pub restored: usize,
    pub expired: usize,
    pub corrupt: usize,
}

struct Slot {
    entry: CacheEntry,
    generation: u64,
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<CacheKey, Slot>,
    next_generation: u64,
}

impl CacheState {
    fn slot_mut(&mut self, key: &CacheKey) -> &mut Slot {
        let generation = self.next_generation;
        let slot = self.slots.entry(key.clone()).or_insert_with(|| Slot {
            entry: CacheEntry::empty(key.clone()),
            generation,
        });
        if slot.generation == generation {
            self.next_generation += 1;
        }
        slot
    }

    fn current(&mut self, key: &CacheKey, generation: u64) -> Option<&mut Slot> {
        self.slots
            .get_mut(key)
            .filter(|slot| slot.generation == generation)
    }

    /// Drop the oldest entries with data beyond `max`; in-flight entries are kept
    fn evict_beyond(&mut self, max: usize) -> Vec<CacheKey> {
        let mut candidates: Vec<(DateTime<Utc>, CacheKey)> = self
            .slots
            .values()
            .filter(|slot| !slot.entry.fetch_in_flight)
            .filter_map(|slot| Some((slot.entry.fetched_at?, slot.entry.key.clone())))
            .collect();
        let with_data = self.slots.values().filter(|s| s.entry.has_data()).count();
        if with_data <= max {
            return Vec::new();
        }

        candidates.sort();
        let evicted: Vec<CacheKey> = candidates
            .into_iter()
            .take(with_data - max)
            .map(|(_, key)| key)
            .collect();
        for key in &evicted {
            self.slots.remove(key);
        }
        evicted
    }
}

pub struct SnapshotCache {
    storage: Arc<dyn KeyValueStore>,
    prefix: String,
    retention: Duration,
    max_entries: Option<usize>,
    state: Mutex<CacheState>,
    // Serializes storage writes against clear/remove so a late write cannot
    // resurrect a deleted record.
    persist_lock: tokio::sync::Mutex<()>,
}

impl SnapshotCache {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            prefix: DEFAULT_PREFIX.to_string(),
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
            max_entries: None,
            state: Mutex::new(CacheState::default()),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_retention(mut self, retention: std::time::Duration) -> Self {
        self.retention = Duration::from_std(retention)
            .unwrap_or_else(|_| Duration::days(DEFAULT_RETENTION_DAYS));
        self
    }

    /// Cap the number of entries holding data; `None` keeps everything
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries.filter(|max| *max > 0);
        self
    }

    /// Current entry for `key`, created empty on first access. Never fetches.
    pub fn get(&self, key: &CacheKey) -> CacheEntry {
        self.lock().slot_mut(key).entry.clone()
    }

    /// View model for `key` without creating an entry
    pub fn status(&self, key: &CacheKey) -> EntryStatus {
        self.lock()
            .slots
            .get(key)
            .map(|slot| slot.entry.status())
            .unwrap_or_default()
    }

    /// Every key the cache currently tracks, sorted
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.lock().slots.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Fetch `key` once, unless a fetch for it is already running.
    ///
    /// On success the payload replaces the old one and is persisted. On
    /// failure the old payload stays and the error is recorded. An abandoned
    /// fetch records nothing.
    pub async fn refresh<F, Fut, E>(&self, key: &CacheKey, fetcher: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: Into<RefreshError>,
    {
        let generation = {
            let mut state = self.lock();
            let slot = state.slot_mut(key);
            if slot.entry.fetch_in_flight {
                debug!("Refresh of {} already in flight", key);
                return RefreshOutcome::AlreadyInFlight;
            }
            slot.entry.fetch_in_flight = true;
            slot.entry.last_error = None;
            slot.generation
        };

        let mut flight = FlightGuard {
            cache: self,
            key,
            generation,
            armed: true,
        };
        info!("Refreshing {}", key);
        let result: Result<Value, RefreshError> = fetcher().await.map_err(Into::into);
        flight.armed = false;

        let fetched_at = Utc::now();
        let payload = {
            let mut state = self.lock();
            let Some(slot) = state.current(key, generation) else {
                debug!("Dropping late response for {}", key);
                return RefreshOutcome::Discarded;
            };
            slot.entry.fetch_in_flight = false;

            match result {
                Ok(payload) => {
                    slot.entry.payload = Some(payload.clone());
                    slot.entry.fetched_at = Some(fetched_at);
                    payload
                }
                Err(e) if e.is_abandoned() => {
                    debug!("Refresh of {} abandoned for interactive login", key);
                    return RefreshOutcome::Abandoned;
                }
                Err(e) => {
                    error!("Refresh of {} failed: {}", key, e);
                    slot.entry.last_error = Some(e.clone());
                    return RefreshOutcome::Failed(e);
                }
            }
        };

        if let Err(e) = self.persist(key, generation, payload, fetched_at).await {
            // Still served from memory until the process exits.
            error!("Failed to persist snapshot {}: {}", key, e);
        }
        info!("Refreshed {}", key);
        RefreshOutcome::Updated
    }

    async fn persist(
        &self,
        key: &CacheKey,
        generation: u64,
        payload: Value,
        fetched_at: DateTime<Utc>,
    ) -> CacheResult<()> {
        let record = PersistedSnapshot::new(key, payload, fetched_at).encode()?;
        let _writer = self.persist_lock.lock().await;

        let evicted = {
            let mut state = self.lock();
            if state.current(key, generation).is_none() {
                debug!("Skipping persist of {}; entry was cleared", key);
                return Ok(());
            }
            match self.max_entries {
                Some(max) => state.evict_beyond(max),
                None => Vec::new(),
            }
        };

        self.storage.set(&self.storage_key(key), &record).await?;
        debug!("Persisted snapshot {}", key);

        for old in evicted {
            info!("Evicting {} to stay within the entry cap", old);
            self.storage.remove(&self.storage_key(&old)).await?;
        }
        Ok(())
    }

    /// Load persisted snapshots into memory.
    ///
    /// Records past the retention ceiling and records that fail to decode are
    /// deleted from storage. Entries already holding data in memory win.
    pub async fn rehydrate(&self) -> CacheResult<RehydrateReport> {
        let _writer = self.persist_lock.lock().await;
        let records = self.storage.entries_with_prefix(&self.prefix).await?;
        let cutoff = Utc::now() - self.retention;
        let mut report = RehydrateReport::default();
        let mut discard = Vec::new();

        for (storage_key, raw) in records {
            let encoded_key = &storage_key[self.prefix.len()..];
            let (key, snapshot) = match PersistedSnapshot::decode(encoded_key, &raw) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!("Discarding snapshot: {}", e);
                    report.corrupt += 1;
                    discard.push(storage_key);
                    continue;
                }
            };

            if snapshot.fetched_at < cutoff {
                debug!("Snapshot {} is past the retention ceiling", key);
                report.expired += 1;
                discard.push(storage_key);
                continue;
            }

            let mut state = self.lock();
            let slot = state.slot_mut(&key);
            if slot.entry.has_data() || slot.entry.fetch_in_flight {
                continue;
            }
            slot.entry.payload = Some(snapshot.payload);
            slot.entry.fetched_at = Some(snapshot.fetched_at);
            report.restored += 1;
        }

        for storage_key in discard {
            self.storage.remove(&storage_key).await?;
        }

        let evicted = match self.max_entries {
            Some(max) => self.lock().evict_beyond(max),
            None => Vec::new(),
        };
        for old in evicted {
            report.restored = report.restored.saturating_sub(1);
            self.storage.remove(&self.storage_key(&old)).await?;
        }

        info!(
            "Rehydrated {} snapshot(s), dropped {} expired and {} corrupt",
            report.restored, report.expired, report.corrupt
        );
        Ok(report)
    }

    /// Forget every entry, in memory and on disk.
    ///
    /// Fetches still running when this is called have their results dropped.
    pub async fn clear(&self) -> CacheResult<u64> {
        let _writer = self.persist_lock.lock().await;
        {
            let mut state = self.lock();
            state.slots.clear();
        }
        let removed = self.storage.clear_prefix(&self.prefix).await?;
        info!("Cleared snapshot cache ({} persisted record(s))", removed);
        Ok(removed)
    }

    /// Forget one entry; returns whether anything was persisted for it
    pub async fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        let _writer = self.persist_lock.lock().await;
        self.lock().slots.remove(key);
        let removed = self.storage.remove(&self.storage_key(key)).await?;
        debug!("Removed {} from the snapshot cache", key);
        Ok(removed)
    }

    fn storage_key(&self, key: &CacheKey) -> String {
        format!("{}{}", self.prefix, key.storage_key())
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Clears the in-flight flag if a refresh is dropped before its fetch resolves
struct FlightGuard<'a> {
    cache: &'a SnapshotCache,
    key: &'a CacheKey,
    generation: u64,
    armed: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(slot) = self.cache.lock().current(self.key, self.generation) {
            slot.entry.fetch_in_flight = false;
            debug!("Refresh of {} cancelled", self.key);
        }
    }
}
