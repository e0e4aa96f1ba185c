// ABOUTME: Identity provider abstraction consumed by the credential manager
// ABOUTME: Lets tests swap the real OAuth flow for fakes that never open a browser

use async_trait::async_trait;

use crate::{
    error::AuthResult,
    events::LoginEvents,
    types::{Identity, Scope, Token},
};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Obtain a token without user interaction.
    ///
    /// Fails with `AuthError::InteractionRequired` when only an interactive
    /// login can produce a token for this identity and scope.
    async fn acquire_silent(&self, scope: &Scope, identity: &Identity) -> AuthResult<Token>;

    /// Hand control to an interactive login for `scope`.
    ///
    /// Nothing is returned to the caller; completion is announced through
    /// [`IdentityProvider::events`].
    async fn acquire_interactive(&self, scope: &Scope) -> AuthResult<()>;

    async fn list_known_accounts(&self) -> AuthResult<Vec<Identity>>;

    /// Forget any session held for `identity`
    async fn sign_out(&self, _identity: &Identity) -> AuthResult<()> {
        Ok(())
    }

    fn events(&self) -> &LoginEvents;
}
