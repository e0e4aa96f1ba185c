// ABOUTME: cloudlens authentication library: identity sessions and bearer tokens
// ABOUTME: Token store, credential manager, identity provider trait and the Entra ID provider

pub mod error;
pub mod events;
pub mod manager;
pub mod oauth;
pub mod provider;
pub mod store;
pub mod types;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use events::{LoginEvent, LoginEvents, SubscriptionId};
pub use manager::CredentialManager;
pub use oauth::{CallbackServer, EntraIdConfig, EntraIdProvider};
pub use provider::IdentityProvider;
pub use store::TokenStore;
pub use types::{Identity, Scope, Token};
