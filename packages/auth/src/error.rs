// ABOUTME: Error types for identity sessions and token acquisition
// ABOUTME: Separates caller-visible kinds from the provider-internal interaction signal

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No active identity; sign in first")]
    NoActiveIdentity,

    /// Silent acquisition needs the user; handled inside the credential manager.
    #[error("Interactive authentication required")]
    InteractionRequired,

    /// An interactive login was started and the current operation abandoned.
    #[error("Interactive login started; the current operation was abandoned")]
    InteractionRedirect,

    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("OAuth authentication failed: {0}")]
    OAuthFailed(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("PKCE error: {0}")]
    Pkce(String),

    #[error("Callback server error: {0}")]
    CallbackServer(String),

    #[error("State mismatch: CSRF protection failed")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    pub fn auth_failure(msg: impl Into<String>) -> Self {
        Self::AuthFailure(msg.into())
    }

    pub fn is_interaction_required(&self) -> bool {
        matches!(self, AuthError::InteractionRequired)
    }

    /// True when the operation was cut short by an interactive login hand-off
    pub fn is_redirect(&self) -> bool {
        matches!(self, AuthError::InteractionRedirect)
    }
}
