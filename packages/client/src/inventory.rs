// ABOUTME: Glue between the snapshot cache and backend requests
// ABOUTME: Reads never fetch; refresh routes through the anonymous or bearer path per kind

use std::sync::Arc;

use cloudlens_auth::Scope;
use cloudlens_cache::{CacheEntry, CacheKey, RefreshError, RefreshOutcome, SnapshotCache};
use tracing::debug;

use crate::{
    catalog::ResourceKind,
    client::AuthenticatedClient,
    error::ClientResult,
};

pub struct Inventory {
    cache: Arc<SnapshotCache>,
    client: AuthenticatedClient,
    base_url: String,
    scope: Scope,
}

impl Inventory {
    pub fn new(
        cache: Arc<SnapshotCache>,
        client: AuthenticatedClient,
        base_url: impl Into<String>,
        scope: Scope,
    ) -> Self {
        Self {
            cache,
            client,
            base_url: base_url.into(),
            scope,
        }
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    pub fn key(kind: ResourceKind, params: &[String]) -> CacheKey {
        CacheKey::with_params(kind.id(), params.iter().cloned())
    }

    /// Cached entry for `kind`; never triggers a request
    pub fn entry(&self, kind: ResourceKind, params: &[String]) -> CacheEntry {
        self.cache.get(&Self::key(kind, params))
    }

    /// Fetch `kind` now and store the result in the cache.
    ///
    /// Only malformed parameters fail here; request failures are recorded on
    /// the entry and reported through the outcome.
    pub async fn refresh(
        &self,
        kind: ResourceKind,
        params: &[String],
    ) -> ClientResult<RefreshOutcome> {
        let url = kind.url(&self.base_url, params)?;
        let key = Self::key(kind, params);
        let client = &self.client;
        let scope = &self.scope;
        let url = url.as_str();

        let outcome = self
            .cache
            .refresh(&key, move || async move {
                let result = if kind.requires_auth() {
                    client.fetch_json(url, scope).await
                } else {
                    client.fetch_anonymous_json(url).await
                };
                result.map_err(RefreshError::from)
            })
            .await;

        debug!("Refresh of {} finished: {:?}", key, outcome);
        Ok(outcome)
    }
}
