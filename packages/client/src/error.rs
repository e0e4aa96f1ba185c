// ABOUTME: Error types for backend requests
// ABOUTME: Converts into the cloneable refresh error stored on cache entries

use cloudlens_auth::AuthError;
use cloudlens_cache::{ErrorKind, RefreshError};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Transport failure (`status` is `None`) or non-2xx response
    #[error("{message}")]
    RequestFailed { status: Option<u16>, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unknown resource kind: {0}")]
    UnknownResource(String),

    #[error("{resource} expects {expected} parameter(s), got {actual}")]
    InvalidParams {
        resource: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<ClientError> for RefreshError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Auth(AuthError::InteractionRedirect) => RefreshError::abandoned(),
            ClientError::Auth(AuthError::NoActiveIdentity) => RefreshError::new(
                ErrorKind::NoActiveIdentity,
                AuthError::NoActiveIdentity.to_string(),
            ),
            ClientError::Auth(auth) => RefreshError::new(ErrorKind::AuthFailure, auth.to_string()),
            ClientError::RequestFailed { status, message } => {
                RefreshError::request_failed(status, message)
            }
            other => RefreshError::new(ErrorKind::Other, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_error_kinds() {
        assert!(RefreshError::from(ClientError::Auth(AuthError::InteractionRedirect)).is_abandoned());
        assert_eq!(
            RefreshError::from(ClientError::Auth(AuthError::NoActiveIdentity)).kind,
            ErrorKind::NoActiveIdentity
        );
        assert_eq!(
            RefreshError::from(ClientError::Auth(AuthError::auth_failure("expired"))).kind,
            ErrorKind::AuthFailure
        );

        let failed = RefreshError::from(ClientError::RequestFailed {
            status: Some(502),
            message: "HTTP 502 Bad Gateway".to_string(),
        });
        assert_eq!(failed.kind, ErrorKind::RequestFailed);
        assert_eq!(failed.status, Some(502));
        assert_eq!(failed.message, "HTTP 502 Bad Gateway");
    }
}
