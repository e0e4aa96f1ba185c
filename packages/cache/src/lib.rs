// ABOUTME: Snapshot cache for remote inventory datasets
// ABOUTME: Fetch on demand, keep until the retention ceiling, survive restarts

pub mod cache;
pub mod entry;
pub mod error;
pub mod key;
mod persist;

pub use cache::{
    RefreshOutcome, RehydrateReport, SnapshotCache, DEFAULT_PREFIX, DEFAULT_RETENTION_DAYS,
};
pub use entry::{CacheEntry, EntryStatus, ErrorKind, RefreshError};
pub use error::{CacheError, CacheResult};
pub use key::CacheKey;
