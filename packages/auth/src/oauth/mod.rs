// ABOUTME: OAuth 2.0 authorization-code flow against Microsoft Entra ID
// ABOUTME: PKCE, loopback callback server, wire types and the provider implementation

pub mod entra;
pub mod pkce;
pub mod server;
pub mod types;

pub use entra::{EntraIdConfig, EntraIdProvider};
pub use server::CallbackServer;
pub use types::PkceChallenge;
