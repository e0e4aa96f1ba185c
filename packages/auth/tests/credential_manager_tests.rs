// ABOUTME: Integration tests for the credential manager
// ABOUTME: Uses a fake identity provider that counts calls and never opens a browser

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use cloudlens_auth::{
    AuthError, AuthResult, CredentialManager, Identity, IdentityProvider, LoginEvent, LoginEvents,
    Scope, Token,
};

#[derive(Clone)]
enum Silent {
    Issue { value: &'static str, expires_in: i64 },
    WrongScope,
    InteractionRequired,
    Fail(&'static str),
}

struct FakeProvider {
    silent: Mutex<Silent>,
    known: Vec<Identity>,
    silent_calls: AtomicUsize,
    interactive_calls: AtomicUsize,
    events: LoginEvents,
}

impl FakeProvider {
    fn new(silent: Silent, known: Vec<Identity>) -> Arc<Self> {
        Arc::new(Self {
            silent: Mutex::new(silent),
            known,
            silent_calls: AtomicUsize::new(0),
            interactive_calls: AtomicUsize::new(0),
            events: LoginEvents::new(),
        })
    }

    fn silent_calls(&self) -> usize {
        self.silent_calls.load(Ordering::SeqCst)
    }

    fn interactive_calls(&self) -> usize {
        self.interactive_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn acquire_silent(&self, scope: &Scope, _identity: &Identity) -> AuthResult<Token> {
        self.silent_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.silent.lock().unwrap().clone();
        match behavior {
            Silent::Issue { value, expires_in } => Ok(Token::new(
                scope.clone(),
                value,
                Utc::now() + Duration::seconds(expires_in),
            )),
            Silent::WrongScope => Ok(Token::new(
                Scope::new(["something-else"]),
                "wrong",
                Utc::now() + Duration::hours(1),
            )),
            Silent::InteractionRequired => Err(AuthError::InteractionRequired),
            Silent::Fail(msg) => Err(AuthError::TokenExchange(msg.to_string())),
        }
    }

    async fn acquire_interactive(&self, _scope: &Scope) -> AuthResult<()> {
        self.interactive_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_known_accounts(&self) -> AuthResult<Vec<Identity>> {
        Ok(self.known.clone())
    }

    fn events(&self) -> &LoginEvents {
        &self.events
    }
}

fn alice() -> Identity {
    Identity::new("oid-alice", "alice@contoso.com")
}

fn bob() -> Identity {
    Identity::new("oid-bob", "bob@contoso.com")
}

fn inventory_scope() -> Scope {
    Scope::new(["api://inventory/user_impersonation"])
}

fn issuing() -> Silent {
    Silent::Issue {
        value: "fresh",
        expires_in: 3600,
    }
}

#[tokio::test]
async fn test_no_active_identity_fails_without_contacting_provider() {
    let provider = FakeProvider::new(issuing(), vec![]);
    let manager = CredentialManager::new(provider.clone());

    let result = manager.acquire_token(&inventory_scope()).await;

    assert!(matches!(result, Err(AuthError::NoActiveIdentity)));
    assert_eq!(provider.silent_calls(), 0);
    assert_eq!(provider.interactive_calls(), 0);
}

#[tokio::test]
async fn test_cached_valid_token_returned_without_provider() {
    let provider = FakeProvider::new(issuing(), vec![]);
    let manager = CredentialManager::new(provider.clone());
    manager.store().set_active(alice());
    let cached = Token::new(inventory_scope(), "cached", Utc::now() + Duration::hours(1));
    manager.store().cache_token("oid-alice", cached.clone());

    let token = manager.acquire_token(&inventory_scope()).await.unwrap();

    assert_eq!(token, cached);
    assert_eq!(provider.silent_calls(), 0);
}

#[tokio::test]
async fn test_token_inside_buffer_is_renewed() {
    let provider = FakeProvider::new(issuing(), vec![]);
    let manager = CredentialManager::new(provider.clone())
        .with_expiry_buffer(std::time::Duration::from_secs(60));
    manager.store().set_active(alice());
    manager.store().cache_token(
        "oid-alice",
        Token::new(inventory_scope(), "stale", Utc::now() + Duration::seconds(5)),
    );

    let token = manager.acquire_token(&inventory_scope()).await.unwrap();

    assert_eq!(token.value, "fresh");
    assert_eq!(provider.silent_calls(), 1);

    // The renewed token is now cached.
    let again = manager.acquire_token(&inventory_scope()).await.unwrap();
    assert_eq!(again.value, "fresh");
    assert_eq!(provider.silent_calls(), 1);
}

#[tokio::test]
async fn test_tokens_are_not_shared_across_scopes() {
    let provider = FakeProvider::new(issuing(), vec![]);
    let manager = CredentialManager::new(provider.clone());
    manager.store().set_active(alice());
    manager.store().cache_token(
        "oid-alice",
        Token::new(Scope::new(["scope-a"]), "for-a", Utc::now() + Duration::hours(1)),
    );

    let token = manager.acquire_token(&Scope::new(["scope-b"])).await.unwrap();

    assert_eq!(token.value, "fresh");
    assert_eq!(token.scope, Scope::new(["scope-b"]));
    assert_eq!(provider.silent_calls(), 1);
}

#[tokio::test]
async fn test_interaction_required_starts_interactive_flow() {
    let provider = FakeProvider::new(Silent::InteractionRequired, vec![]);
    let manager = CredentialManager::new(provider.clone());
    manager.store().set_active(alice());

    let result = manager.acquire_token(&inventory_scope()).await;

    assert!(matches!(result, Err(AuthError::InteractionRedirect)));
    assert_eq!(provider.silent_calls(), 1);
    assert_eq!(provider.interactive_calls(), 1);
}

#[tokio::test]
async fn test_other_provider_failures_surface_as_auth_failure() {
    let provider = FakeProvider::new(Silent::Fail("tenant disabled"), vec![]);
    let manager = CredentialManager::new(provider.clone());
    manager.store().set_active(alice());

    let result = manager.acquire_token(&inventory_scope()).await;

    match result {
        Err(AuthError::AuthFailure(msg)) => assert!(msg.contains("tenant disabled")),
        other => panic!("expected AuthFailure, got {:?}", other),
    }
    assert_eq!(provider.interactive_calls(), 0);
}

#[tokio::test]
async fn test_renewed_token_expiring_too_soon_is_rejected() {
    let provider = FakeProvider::new(
        Silent::Issue {
            value: "short",
            expires_in: 2,
        },
        vec![],
    );
    let manager = CredentialManager::new(provider.clone());
    manager.store().set_active(alice());

    let result = manager.acquire_token(&inventory_scope()).await;

    assert!(matches!(result, Err(AuthError::AuthFailure(_))));
    assert!(manager
        .store()
        .cached_token("oid-alice", &inventory_scope())
        .is_none());
}

#[tokio::test]
async fn test_token_for_wrong_scope_is_rejected() {
    let provider = FakeProvider::new(Silent::WrongScope, vec![]);
    let manager = CredentialManager::new(provider.clone());
    manager.store().set_active(alice());

    let result = manager.acquire_token(&inventory_scope()).await;

    assert!(matches!(result, Err(AuthError::AuthFailure(_))));
}

#[tokio::test]
async fn test_initialize_selects_sole_known_account() {
    let provider = FakeProvider::new(issuing(), vec![alice()]);
    let manager = CredentialManager::new(provider.clone());

    let active = manager.initialize().await.unwrap();

    assert_eq!(active, Some(alice()));
    assert_eq!(manager.active_identity(), Some(alice()));
}

#[tokio::test]
async fn test_initialize_leaves_active_unset_with_several_accounts() {
    let provider = FakeProvider::new(issuing(), vec![alice(), bob()]);
    let manager = CredentialManager::new(provider.clone());

    let active = manager.initialize().await.unwrap();

    assert_eq!(active, None);
    assert_eq!(manager.store().known().len(), 2);
}

#[tokio::test]
async fn test_login_event_updates_active_identity_and_token() {
    let provider = FakeProvider::new(issuing(), vec![alice()]);
    let manager = CredentialManager::new(provider.clone());
    manager.initialize().await.unwrap();

    let issued = Token::new(inventory_scope(), "from-login", Utc::now() + Duration::hours(1));
    provider.events().emit(&LoginEvent {
        identity: bob(),
        token: Some(issued.clone()),
    });

    assert_eq!(manager.active_identity(), Some(bob()));
    let token = manager.acquire_token(&inventory_scope()).await.unwrap();
    assert_eq!(token, issued);
    assert_eq!(provider.silent_calls(), 0);
}

#[tokio::test]
async fn test_initialize_subscribes_once_and_shutdown_detaches() {
    let provider = FakeProvider::new(issuing(), vec![]);
    let manager = CredentialManager::new(provider.clone());

    manager.initialize().await.unwrap();
    manager.initialize().await.unwrap();
    assert_eq!(provider.events().listener_count(), 1);

    manager.shutdown();
    assert_eq!(provider.events().listener_count(), 0);

    provider.events().emit(&LoginEvent {
        identity: alice(),
        token: None,
    });
    assert_eq!(manager.active_identity(), None);
}

#[tokio::test]
async fn test_login_starts_interactive_flow() {
    let provider = FakeProvider::new(issuing(), vec![]);
    let manager = CredentialManager::new(provider.clone());

    manager.login(&inventory_scope()).await.unwrap();

    assert_eq!(provider.interactive_calls(), 1);
}

#[tokio::test]
async fn test_logout_clears_identity_and_tokens() {
    let provider = FakeProvider::new(issuing(), vec![]);
    let manager = CredentialManager::new(provider.clone());
    manager.store().set_active(alice());
    manager.acquire_token(&inventory_scope()).await.unwrap();

    manager.logout().await.unwrap();

    assert_eq!(manager.active_identity(), None);
    assert!(manager
        .store()
        .cached_token("oid-alice", &inventory_scope())
        .is_none());
    assert!(matches!(
        manager.acquire_token(&inventory_scope()).await,
        Err(AuthError::NoActiveIdentity)
    ));
}
