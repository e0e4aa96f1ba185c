// ABOUTME: Identity provider used when no Entra ID client id is configured
// ABOUTME: Anonymous endpoints keep working; anything needing a token reports the missing setting

use async_trait::async_trait;
use cloudlens_auth::{AuthError, AuthResult, Identity, IdentityProvider, LoginEvents, Scope, Token};
use cloudlens_config::constants::CLOUDLENS_CLIENT_ID;

#[derive(Default)]
pub struct UnconfiguredProvider {
    events: LoginEvents,
}

impl UnconfiguredProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn missing() -> AuthError {
        AuthError::Configuration(format!("{} is not set", CLOUDLENS_CLIENT_ID))
    }
}

#[async_trait]
impl IdentityProvider for UnconfiguredProvider {
    async fn acquire_silent(&self, _scope: &Scope, _identity: &Identity) -> AuthResult<Token> {
        Err(Self::missing())
    }

    async fn acquire_interactive(&self, _scope: &Scope) -> AuthResult<()> {
        Err(Self::missing())
    }

    async fn list_known_accounts(&self) -> AuthResult<Vec<Identity>> {
        Ok(Vec::new())
    }

    fn events(&self) -> &LoginEvents {
        &self.events
    }
}
