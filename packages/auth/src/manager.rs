// ABOUTME: Credential manager resolving bearer tokens for a permission scope
// ABOUTME: Cached token first, then silent renewal, then an interactive login hand-off

use std::sync::{Arc, Mutex};

use chrono::Duration;
use tracing::{debug, error, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    events::SubscriptionId,
    provider::IdentityProvider,
    store::TokenStore,
    types::{Identity, Scope, Token},
};

/// Default minimum remaining lifetime for a token handed to callers
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 30;

pub struct CredentialManager {
    store: Arc<TokenStore>,
    provider: Arc<dyn IdentityProvider>,
    expiry_buffer: Duration,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl CredentialManager {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self::with_store(provider, Arc::new(TokenStore::new()))
    }

    pub fn with_store(provider: Arc<dyn IdentityProvider>, store: Arc<TokenStore>) -> Self {
        Self {
            store,
            provider,
            expiry_buffer: Duration::seconds(DEFAULT_EXPIRY_BUFFER_SECS),
            subscription: Mutex::new(None),
        }
    }

    pub fn with_expiry_buffer(mut self, buffer: std::time::Duration) -> Self {
        self.expiry_buffer =
            Duration::from_std(buffer).unwrap_or(Duration::seconds(DEFAULT_EXPIRY_BUFFER_SECS));
        self
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn active_identity(&self) -> Option<Identity> {
        self.store.get_active()
    }

    /// Explicit startup step.
    ///
    /// Subscribes the token store to login events, loads the provider's known
    /// accounts and adopts the sole known account when none is active.
    pub async fn initialize(&self) -> AuthResult<Option<Identity>> {
        {
            let mut subscription = self.lock_subscription();
            if subscription.is_none() {
                let store = self.store.clone();
                let id = self.provider.events().subscribe(move |event| {
                    store.on_identity_established(event.identity.clone());
                    if let Some(token) = &event.token {
                        store.cache_token(&event.identity.id, token.clone());
                    }
                });
                *subscription = Some(id);
            }
        }

        let known = self.provider.list_known_accounts().await?;
        debug!("Identity provider reports {} known account(s)", known.len());
        self.store.set_known(known);
        Ok(self.store.select_default())
    }

    /// Detach from login events; the store keeps its current state
    pub fn shutdown(&self) {
        if let Some(id) = self.lock_subscription().take() {
            self.provider.events().unsubscribe(id);
        }
    }

    /// Resolve a bearer token for exactly `scope`.
    ///
    /// Returns `InteractionRedirect` after starting an interactive login; the
    /// caller's operation is abandoned and should not be retried automatically.
    pub async fn acquire_token(&self, scope: &Scope) -> AuthResult<Token> {
        let identity = self.store.get_active().ok_or(AuthError::NoActiveIdentity)?;

        if let Some(token) = self.store.cached_token(&identity.id, scope) {
            if token.is_valid_for(self.expiry_buffer) {
                debug!("Using cached token for scope {}", scope);
                return Ok(token);
            }
            debug!("Cached token for scope {} is inside the expiry buffer", scope);
        }

        match self.provider.acquire_silent(scope, &identity).await {
            Ok(token) => {
                if token.scope != *scope {
                    error!(
                        "Provider returned token for {} when {} was requested",
                        token.scope, scope
                    );
                    return Err(AuthError::auth_failure(format!(
                        "token issued for {} instead of {}",
                        token.scope, scope
                    )));
                }
                if !token.is_valid_for(self.expiry_buffer) {
                    warn!("Renewed token for scope {} expires too soon", scope);
                    return Err(AuthError::auth_failure(
                        "renewed token expires within the expiry buffer",
                    ));
                }
                self.store.cache_token(&identity.id, token.clone());
                debug!("Silently renewed token for scope {}", scope);
                Ok(token)
            }
            Err(AuthError::InteractionRequired) => {
                info!(
                    "Silent acquisition for {} needs interaction; starting interactive login",
                    scope
                );
                self.provider.acquire_interactive(scope).await?;
                Err(AuthError::InteractionRedirect)
            }
            Err(e @ AuthError::AuthFailure(_)) => Err(e),
            Err(e) => {
                error!("Silent token acquisition failed: {}", e);
                Err(AuthError::AuthFailure(e.to_string()))
            }
        }
    }

    /// Start an interactive login directly (application bootstrap)
    pub async fn login(&self, scope: &Scope) -> AuthResult<Option<Identity>> {
        self.provider.acquire_interactive(scope).await?;
        Ok(self.store.get_active())
    }

    /// Drop the active identity, its provider session and every cached token
    pub async fn logout(&self) -> AuthResult<()> {
        if let Some(identity) = self.store.get_active() {
            self.provider.sign_out(&identity).await?;
            info!("Signed out {}", identity.username);
        }
        self.store.reset();
        Ok(())
    }

    fn lock_subscription(&self) -> std::sync::MutexGuard<'_, Option<SubscriptionId>> {
        self.subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for CredentialManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
