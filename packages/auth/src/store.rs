// ABOUTME: In-memory session state: the active identity, known identities and cached tokens
// ABOUTME: Pure state and accessors; nothing here touches the network or disk

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::types::{Identity, Scope, Token};

#[derive(Debug, Default)]
struct StoreState {
    active: Option<Identity>,
    known: Vec<Identity>,
    tokens: HashMap<(String, Scope), Token>,
}

/// Session state shared by the credential manager and login event listeners
#[derive(Debug, Default)]
pub struct TokenStore {
    state: RwLock<StoreState>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the active identity. Setting the same identity twice is a no-op.
    pub fn set_active(&self, identity: Identity) {
        let mut state = self.write();
        if state.active.as_ref() == Some(&identity) {
            return;
        }
        remember(&mut state.known, &identity);
        debug!("Active identity set to {}", identity.username);
        state.active = Some(identity);
    }

    pub fn get_active(&self) -> Option<Identity> {
        self.read().active.clone()
    }

    /// Called when a login completes; the most recent login wins.
    pub fn on_identity_established(&self, identity: Identity) {
        info!("Identity established: {}", identity.username);
        self.set_active(identity);
    }

    pub fn set_known(&self, identities: Vec<Identity>) {
        let mut state = self.write();
        for identity in &identities {
            remember(&mut state.known, identity);
        }
    }

    pub fn known(&self) -> Vec<Identity> {
        self.read().known.clone()
    }

    /// Startup rule: adopt the only known identity when none is active.
    /// With zero or several known identities the active slot stays empty.
    pub fn select_default(&self) -> Option<Identity> {
        let mut state = self.write();
        if state.active.is_none() && state.known.len() == 1 {
            let only = state.known[0].clone();
            debug!("Selecting sole known identity {} as active", only.username);
            state.active = Some(only);
        }
        state.active.clone()
    }

    pub fn cached_token(&self, identity_id: &str, scope: &Scope) -> Option<Token> {
        self.read()
            .tokens
            .get(&(identity_id.to_string(), scope.clone()))
            .cloned()
    }

    pub fn cache_token(&self, identity_id: &str, token: Token) {
        self.write()
            .tokens
            .insert((identity_id.to_string(), token.scope.clone()), token);
    }

    pub fn clear_tokens(&self) {
        self.write().tokens.clear();
    }

    /// Drop everything: active identity, known identities and tokens
    pub fn reset(&self) {
        *self.write() = StoreState::default();
    }
}

fn remember(known: &mut Vec<Identity>, identity: &Identity) {
    match known.iter_mut().find(|k| k.id == identity.id) {
        Some(existing) => *existing = identity.clone(),
        None => known.push(identity.clone()),
    }
}
