// ABOUTME: Core identity and token types
// ABOUTME: Identities are plain data; tokens are scope-bound secrets that never leave memory

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A signed-in principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable object id from the identity provider
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            tenant_id: None,
            display_name: None,
        }
    }
}

/// Set of permissions a token is valid for. Order of construction does not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope(BTreeSet<String>);

impl Scope {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Space-delimited form used in OAuth `scope` parameters
    pub fn as_param(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for Scope {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.as_param())
    }
}

/// Short-lived bearer token for exactly one scope
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub scope: Scope,
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(scope: Scope, value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            scope,
            value: value.into(),
            expires_at,
        }
    }

    /// True when the token is still usable `buffer` from now.
    /// Expiring exactly at the buffer edge still counts as valid.
    pub fn is_valid_for(&self, buffer: Duration) -> bool {
        self.expires_at >= Utc::now() + buffer
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("scope", &self.scope)
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_in(seconds: i64) -> Token {
        Token::new(
            Scope::new(["api://inventory/user_impersonation"]),
            "secret-value",
            Utc::now() + Duration::seconds(seconds),
        )
    }

    #[test]
    fn test_scope_ignores_order_and_duplicates() {
        let a = Scope::new(["b", "a", "a"]);
        let b: Scope = ["a", "b"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.as_param(), "a b");
    }

    #[test]
    fn test_scopes_differ() {
        assert_ne!(Scope::new(["a"]), Scope::new(["a", "b"]));
    }

    #[test]
    fn test_token_valid_outside_buffer() {
        let token = token_expiring_in(600);
        assert!(token.is_valid_for(Duration::seconds(30)));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_inside_buffer_is_not_valid() {
        let token = token_expiring_in(10);
        assert!(!token.is_valid_for(Duration::seconds(30)));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_expired_in_past() {
        let token = token_expiring_in(-60);
        assert!(!token.is_valid_for(Duration::zero()));
        assert!(token.is_expired());
    }

    #[test]
    fn test_token_debug_redacts_value() {
        let rendered = format!("{:?}", token_expiring_in(60));
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_bearer_header_value() {
        assert_eq!(token_expiring_in(60).bearer(), "Bearer secret-value");
    }
}
