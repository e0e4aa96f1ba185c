// ABOUTME: Identity provider backed by Microsoft Entra ID (v2.0 endpoints)
// ABOUTME: Interactive login via PKCE + loopback redirect, silent renewal via in-memory refresh tokens

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use reqwest::Client;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    error::{AuthError, AuthResult},
    events::{LoginEvent, LoginEvents},
    oauth::{
        pkce::generate_pkce_challenge,
        server::{CallbackServer, DEFAULT_CALLBACK_PORT},
        types::{IdTokenClaims, PkceChallenge, TokenErrorResponse, TokenResponse},
    },
    provider::IdentityProvider,
    types::{Identity, Scope, Token},
};

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Token endpoint error codes that only a user can resolve
const INTERACTION_ERRORS: &[&str] = &[
    "invalid_grant",
    "interaction_required",
    "consent_required",
    "login_required",
];

/// Always requested on top of the resource scope
const LOGIN_SCOPES: &[&str] = &["openid", "profile", "offline_access"];

#[derive(Debug, Clone)]
pub struct EntraIdConfig {
    pub client_id: String,
    pub tenant_id: String,
    pub authority_host: String,
    pub redirect_port: u16,
    pub open_browser: bool,
}

impl EntraIdConfig {
    pub fn new(client_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            redirect_port: DEFAULT_CALLBACK_PORT,
            open_browser: true,
        }
    }

    pub fn authority(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority())
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority())
    }

    pub fn redirect_uri(&self) -> String {
        CallbackServer::with_port(self.redirect_port).callback_url()
    }
}

struct Session {
    identity: Identity,
    refresh_token: String,
}

pub struct EntraIdProvider {
    config: EntraIdConfig,
    client: Client,
    sessions: RwLock<HashMap<String, Session>>,
    events: LoginEvents,
}

impl EntraIdProvider {
    pub fn new(config: EntraIdConfig) -> AuthResult<Self> {
        if config.client_id.trim().is_empty() {
            return Err(AuthError::Configuration("client id is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .connect_timeout(StdDuration::from_secs(10))
            .build()?;

        Ok(Self {
            config,
            client,
            sessions: RwLock::new(HashMap::new()),
            events: LoginEvents::new(),
        })
    }

    pub fn config(&self) -> &EntraIdConfig {
        &self.config
    }

    /// Register a session obtained elsewhere in this process
    pub fn insert_session(&self, identity: Identity, refresh_token: impl Into<String>) {
        self.write_sessions().insert(
            identity.id.clone(),
            Session {
                identity,
                refresh_token: refresh_token.into(),
            },
        );
    }

    /// Authorization URL for the interactive step
    pub fn build_auth_url(
        &self,
        scope: &Scope,
        pkce: &PkceChallenge,
        state: &str,
    ) -> AuthResult<String> {
        let mut url = Url::parse(&self.config.authorize_url())
            .map_err(|e| AuthError::Configuration(format!("Invalid authorize URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.config.redirect_uri())
            .append_pair("response_mode", "query")
            .append_pair("scope", &Self::request_scope(scope))
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", &pkce.code_challenge_method)
            .append_pair("state", state)
            .append_pair("prompt", "select_account");

        Ok(url.to_string())
    }

    fn request_scope(scope: &Scope) -> String {
        let mut all: Vec<&str> = scope.iter().collect();
        for extra in LOGIN_SCOPES {
            if !all.contains(extra) {
                all.push(extra);
            }
        }
        all.join(" ")
    }

    /// Exchange an authorization code and record the resulting session
    async fn redeem_code(
        &self,
        code: &str,
        code_verifier: &str,
        scope: &Scope,
    ) -> AuthResult<LoginEvent> {
        let form = [
            ("client_id", self.config.client_id.clone()),
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", self.config.redirect_uri()),
            ("code_verifier", code_verifier.to_string()),
            ("scope", Self::request_scope(scope)),
        ];

        let response = self.post_token(&form).await.map_err(|e| match e {
            AuthError::InteractionRequired => {
                AuthError::TokenExchange("authorization code was rejected".to_string())
            }
            other => other,
        })?;

        let id_token = response
            .id_token
            .as_deref()
            .ok_or_else(|| AuthError::InvalidToken("token response has no id_token".to_string()))?;
        let identity = Self::identity_from_id_token(id_token)?;

        let token = Token::new(
            scope.clone(),
            response.access_token,
            Utc::now() + Duration::seconds(response.expires_in),
        );

        match response.refresh_token {
            Some(refresh_token) => self.insert_session(identity.clone(), refresh_token),
            None => warn!("No refresh token issued; silent renewal will not be possible"),
        }

        info!("Signed in as {}", identity.username);
        Ok(LoginEvent {
            identity,
            token: Some(token),
        })
    }

    async fn post_token(&self, form: &[(&str, String)]) -> AuthResult<TokenResponse> {
        let response = self
            .client
            .post(self.config.token_url())
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::AuthFailure(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<TokenResponse>().await.map_err(|e| {
                AuthError::TokenExchange(format!("Failed to parse token response: {}", e))
            });
        }

        // Only the error code is logged; descriptions can echo request data.
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) if INTERACTION_ERRORS.contains(&err.error.as_str()) => {
                debug!("Token endpoint requires interaction ({})", err.error);
                Err(AuthError::InteractionRequired)
            }
            Ok(err) => {
                error!("Token endpoint returned {} ({})", status, err.error);
                Err(AuthError::AuthFailure(match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                }))
            }
            Err(_) => {
                error!("Token endpoint returned {}", status);
                Err(AuthError::AuthFailure(format!(
                    "token endpoint returned {}",
                    status
                )))
            }
        }
    }

    /// Decode the (already TLS-verified) id_token payload into an identity
    pub fn identity_from_id_token(id_token: &str) -> AuthResult<Identity> {
        let payload = id_token
            .split('.')
            .nth(1)
            .ok_or_else(|| AuthError::InvalidToken("id_token is not a JWT".to_string()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::InvalidToken(format!("id_token payload: {}", e)))?;
        let claims: IdTokenClaims = serde_json::from_slice(&bytes)?;

        let id = claims.oid.unwrap_or_else(|| claims.sub.clone());
        let username = claims
            .preferred_username
            .unwrap_or_else(|| claims.sub.clone());

        Ok(Identity {
            id,
            username,
            tenant_id: claims.tid,
            display_name: claims.name,
        })
    }

    fn read_sessions(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_sessions(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl IdentityProvider for EntraIdProvider {
    async fn acquire_silent(&self, scope: &Scope, identity: &Identity) -> AuthResult<Token> {
        let refresh_token = self
            .read_sessions()
            .get(&identity.id)
            .map(|s| s.refresh_token.clone())
            .ok_or(AuthError::InteractionRequired)?;

        debug!("Renewing token for {} scope {}", identity.username, scope);
        let form = [
            ("client_id", self.config.client_id.clone()),
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token),
            ("scope", Self::request_scope(scope)),
        ];
        let response = self.post_token(&form).await?;

        if let Some(rotated) = response.refresh_token {
            if let Some(session) = self.write_sessions().get_mut(&identity.id) {
                session.refresh_token = rotated;
            }
        }

        Ok(Token::new(
            scope.clone(),
            response.access_token,
            Utc::now() + Duration::seconds(response.expires_in),
        ))
    }

    async fn acquire_interactive(&self, scope: &Scope) -> AuthResult<()> {
        let pkce = generate_pkce_challenge()?;
        let expected_state = nanoid::nanoid!();
        let auth_url = self.build_auth_url(scope, &pkce, &expected_state)?;

        info!("Sign in at: {}", auth_url);
        if self.config.open_browser {
            if let Err(e) = open::that(&auth_url) {
                warn!("Failed to open browser ({}); visit the URL above manually", e);
            }
        }

        let (code, returned_state) = CallbackServer::with_port(self.config.redirect_port)
            .wait_for_callback()
            .await?;

        if returned_state != expected_state {
            error!("OAuth state mismatch on callback");
            return Err(AuthError::StateMismatch);
        }

        let event = self.redeem_code(&code, &pkce.code_verifier, scope).await?;
        self.events.emit(&event);
        Ok(())
    }

    async fn list_known_accounts(&self) -> AuthResult<Vec<Identity>> {
        Ok(self
            .read_sessions()
            .values()
            .map(|s| s.identity.clone())
            .collect())
    }

    async fn sign_out(&self, identity: &Identity) -> AuthResult<()> {
        if self.write_sessions().remove(&identity.id).is_some() {
            debug!("Dropped refresh token for {}", identity.username);
        }
        Ok(())
    }

    fn events(&self) -> &LoginEvents {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn id_token(claims: serde_json::Value) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        )
    }

    fn provider_for(server: &MockServer) -> EntraIdProvider {
        let mut config = EntraIdConfig::new("client-123", "tenant-abc");
        config.authority_host = server.uri();
        config.open_browser = false;
        EntraIdProvider::new(config).unwrap()
    }

    #[test]
    fn test_endpoints() {
        let config = EntraIdConfig::new("client-123", "tenant-abc");
        assert_eq!(
            config.token_url(),
            "https://login.microsoftonline.com/tenant-abc/oauth2/v2.0/token"
        );
        assert_eq!(config.redirect_uri(), "http://localhost:3737/auth/callback");
    }

    #[test]
    fn test_empty_client_id_rejected() {
        let result = EntraIdProvider::new(EntraIdConfig::new(" ", "common"));
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_build_auth_url() {
        let provider = EntraIdProvider::new(EntraIdConfig::new("client-123", "common")).unwrap();
        let pkce = generate_pkce_challenge().unwrap();
        let url = provider
            .build_auth_url(&Scope::new(["api://client-123/user_impersonation"]), &pkce, "st")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["state"], "st");
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(
            pairs["scope"],
            "api://client-123/user_impersonation openid profile offline_access"
        );
    }

    #[test]
    fn test_identity_from_id_token() {
        let token = id_token(serde_json::json!({
            "sub": "subject",
            "oid": "object-id",
            "preferred_username": "ops@contoso.com",
            "name": "Ops",
            "tid": "tenant-abc"
        }));
        let identity = EntraIdProvider::identity_from_id_token(&token).unwrap();
        assert_eq!(identity.id, "object-id");
        assert_eq!(identity.username, "ops@contoso.com");
        assert_eq!(identity.tenant_id.as_deref(), Some("tenant-abc"));
    }

    #[test]
    fn test_identity_falls_back_to_sub() {
        let token = id_token(serde_json::json!({ "sub": "subject" }));
        let identity = EntraIdProvider::identity_from_id_token(&token).unwrap();
        assert_eq!(identity.id, "subject");
        assert_eq!(identity.username, "subject");
    }

    #[test]
    fn test_malformed_id_token() {
        assert!(EntraIdProvider::identity_from_id_token("not-a-jwt").is_err());
    }

    #[tokio::test]
    async fn test_redeem_code_records_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-abc/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 3600,
                "token_type": "Bearer",
                "id_token": id_token(serde_json::json!({
                    "sub": "s", "oid": "oid-1", "preferred_username": "ops@contoso.com"
                }))
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let scope = Scope::new(["api://inventory/read"]);
        let event = provider.redeem_code("code", "verifier", &scope).await.unwrap();

        assert_eq!(event.identity.id, "oid-1");
        let token = event.token.unwrap();
        assert_eq!(token.value, "access-1");
        assert_eq!(token.scope, scope);

        let known = provider.list_known_accounts().await.unwrap();
        assert_eq!(known.len(), 1);
        assert_eq!(known[0].username, "ops@contoso.com");
    }
}
