// ABOUTME: Cache keys naming a resource kind plus its parameters
// ABOUTME: Rendered as a path for display and as a JSON array for storage

use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CacheKey {
    resource: String,
    params: Vec<String>,
}

impl CacheKey {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params<I, S>(resource: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource: resource.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// `["resource","param1",...]`
    pub fn storage_key(&self) -> String {
        Value::from(self.segments()).to_string()
    }

    pub fn from_storage_key(raw: &str) -> Option<Self> {
        let segments: Vec<String> = serde_json::from_str(raw).ok()?;
        Self::from_segments(segments)
    }

    pub(crate) fn segments(&self) -> Vec<String> {
        std::iter::once(self.resource.clone())
            .chain(self.params.iter().cloned())
            .collect()
    }

    pub(crate) fn from_segments(segments: Vec<String>) -> Option<Self> {
        let mut segments = segments.into_iter();
        let resource = segments.next().filter(|r| !r.is_empty())?;
        Some(Self {
            resource,
            params: segments.collect(),
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        for param in &self.params {
            write!(f, "/{}", param)?;
        }
        Ok(())
    }
}
