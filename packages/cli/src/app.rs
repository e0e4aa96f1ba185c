// ABOUTME: Wires configuration, credentials, storage, cache and clients together
// ABOUTME: One App per process; the binary's commands only talk to this

use std::sync::Arc;

use anyhow::Context;
use cloudlens_ai::{Summary, SummaryService, SummaryTarget};
use cloudlens_auth::{
    CredentialManager, EntraIdConfig, EntraIdProvider, Identity, IdentityProvider, Scope,
};
use cloudlens_cache::{RehydrateReport, SnapshotCache};
use cloudlens_client::{AuthenticatedClient, Inventory, ResourceKind};
use cloudlens_config::Config;
use cloudlens_storage::{KeyValueStore, SqliteStore};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::provider::UnconfiguredProvider;

pub struct App {
    config: Config,
    scope: Scope,
    credentials: Arc<CredentialManager>,
    inventory: Inventory,
    summaries: SummaryService,
}

impl App {
    /// Build the application from `config` using the on-disk store and Entra ID
    pub async fn bootstrap(config: Config) -> anyhow::Result<Self> {
        let provider: Arc<dyn IdentityProvider> = match &config.client_id {
            Some(client_id) => {
                let mut entra = EntraIdConfig::new(client_id.clone(), config.tenant_id.clone());
                entra.redirect_port = config.redirect_port;
                Arc::new(EntraIdProvider::new(entra).context("Failed to set up Entra ID sign-in")?)
            }
            None => {
                debug!("No client id configured; authenticated resources are unavailable");
                Arc::new(UnconfiguredProvider::new())
            }
        };

        let path = config.database_path();
        let storage = SqliteStore::open(&path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;

        Self::assemble(config, provider, Arc::new(storage)).await
    }

    /// Build from explicit collaborators
    pub async fn assemble(
        config: Config,
        provider: Arc<dyn IdentityProvider>,
        storage: Arc<dyn KeyValueStore>,
    ) -> anyhow::Result<Self> {
        let credentials = Arc::new(
            CredentialManager::new(provider).with_expiry_buffer(config.token_expiry_buffer),
        );
        if let Some(identity) = credentials.initialize().await? {
            info!("Active identity: {}", identity.username);
        }

        let cache = Arc::new(
            SnapshotCache::new(storage)
                .with_retention(config.retention)
                .with_max_entries(config.max_cache_entries),
        );
        let client = AuthenticatedClient::new(credentials.clone(), config.http_timeout)?;
        let scope = Scope::new(config.api_scopes.iter().cloned());
        let inventory = Inventory::new(cache, client, config.api_url.clone(), scope.clone());
        let summaries =
            SummaryService::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;

        Ok(Self {
            config,
            scope,
            credentials,
            inventory,
            summaries,
        })
    }

    /// Load persisted snapshots; must run before anything reads the cache
    pub async fn rehydrate(&self) -> anyhow::Result<RehydrateReport> {
        Ok(self.inventory.cache().rehydrate().await?)
    }

    /// Interactive sign-in for the API scope
    pub async fn login(&self) -> anyhow::Result<Option<Identity>> {
        Ok(self.credentials.login(&self.scope).await?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        self.inventory.cache()
    }

    pub fn summaries(&self) -> &SummaryService {
        &self.summaries
    }

    /// Insights for the stored snapshot of `kind`; `None` when nothing is stored.
    /// Only account and bucket details can be summarized.
    pub async fn summarize(
        &self,
        kind: ResourceKind,
        params: &[String],
    ) -> anyhow::Result<Option<(SummaryTarget, Summary)>> {
        let target = summary_target(kind)?;
        kind.check_params(params)?;

        let Some(details) = self.inventory.entry(kind, params).payload else {
            return Ok(None);
        };
        let subject = summary_subject(kind, details, params);
        Ok(Some((target, self.summaries.summarize(target, &subject).await)))
    }

    pub fn shutdown(&self) {
        self.credentials.shutdown();
    }
}

pub fn summary_target(kind: ResourceKind) -> anyhow::Result<SummaryTarget> {
    match kind {
        ResourceKind::AzureDetails => Ok(SummaryTarget::StorageAccount),
        ResourceKind::S3Details => Ok(SummaryTarget::S3Bucket),
        other => anyhow::bail!(
            "Summaries are available for {} and {}, not {}",
            ResourceKind::AzureDetails.id(),
            ResourceKind::S3Details.id(),
            other.id()
        ),
    }
}

/// Identifying parameters first, then the snapshot's own fields
fn summary_subject(kind: ResourceKind, details: Value, params: &[String]) -> Value {
    let mut subject = Map::new();
    if let Some(name) = params.first() {
        subject.insert("name".to_string(), Value::from(name.as_str()));
    }
    if kind == ResourceKind::AzureDetails {
        if let Some(group) = params.get(1) {
            subject.insert("resource_group".to_string(), Value::from(group.as_str()));
        }
    }
    if let Value::Object(fields) = details {
        subject.extend(fields);
    }
    Value::Object(subject)
}
