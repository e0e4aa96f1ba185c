// ABOUTME: Cache entries and the refresh error recorded on them
// ABOUTME: Entries are created empty on first read and mutated only by refresh

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::key::CacheKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoActiveIdentity,
    AuthFailure,
    RequestFailed,
    /// An interactive login took over; recorded nowhere.
    InteractionRedirect,
    Other,
}

/// Why the most recent refresh of an entry failed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct RefreshError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl RefreshError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn request_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::RequestFailed,
            status,
            message: message.into(),
        }
    }

    pub fn abandoned() -> Self {
        Self::new(
            ErrorKind::InteractionRedirect,
            "interactive login started; refresh abandoned",
        )
    }

    pub fn is_abandoned(&self) -> bool {
        self.kind == ErrorKind::InteractionRedirect
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: Option<Value>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub fetch_in_flight: bool,
    pub last_error: Option<RefreshError>,
}

impl CacheEntry {
    pub fn empty(key: CacheKey) -> Self {
        Self {
            key,
            payload: None,
            fetched_at: None,
            fetch_in_flight: false,
            last_error: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.payload.is_some()
    }

    pub fn status(&self) -> EntryStatus {
        EntryStatus {
            has_data: self.has_data(),
            fetching: self.fetch_in_flight,
            error: self.last_error.as_ref().map(|e| e.message.clone()),
            last_updated: self.fetched_at,
        }
    }
}

/// What a view needs to render an entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryStatus {
    pub has_data: bool,
    pub fetching: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_entry() {
        let entry = CacheEntry::empty(CacheKey::new("ec2-instances"));
        assert!(!entry.has_data());
        assert_eq!(entry.status(), EntryStatus::default());
    }

    #[test]
    fn test_status_reflects_payload_and_error() {
        let now = Utc::now();
        let mut entry = CacheEntry::empty(CacheKey::new("ec2-volumes"));
        entry.payload = Some(json!([{"VolumeId": "vol-1"}]));
        entry.fetched_at = Some(now);
        entry.last_error = Some(RefreshError::request_failed(Some(503), "HTTP 503"));

        let status = entry.status();
        assert!(status.has_data);
        assert!(!status.fetching);
        assert_eq!(status.error.as_deref(), Some("HTTP 503"));
        assert_eq!(status.last_updated, Some(now));
    }

    #[test]
    fn test_abandoned_error_kind() {
        assert!(RefreshError::abandoned().is_abandoned());
        assert!(!RefreshError::new(ErrorKind::AuthFailure, "nope").is_abandoned());
    }
}
