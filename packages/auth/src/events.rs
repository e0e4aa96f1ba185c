// ABOUTME: Observer registry for "login succeeded" notifications
// ABOUTME: Explicit subscribe/unsubscribe so tests can inject synthetic login events

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::types::{Identity, Token};

/// Emitted once an interactive login completes
#[derive(Debug, Clone)]
pub struct LoginEvent {
    pub identity: Identity,
    /// Token issued alongside the login, if the provider received one
    pub token: Option<Token>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&LoginEvent) + Send + Sync>;

#[derive(Default)]
pub struct LoginEvents {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl LoginEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&LoginEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        debug!("Login listener {:?} subscribed", id);
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        before != listeners.len()
    }

    pub fn emit(&self, event: &LoginEvent) {
        // Listeners run outside the lock so they may subscribe or unsubscribe.
        let snapshot: Vec<Listener> = self.lock().iter().map(|(_, l)| l.clone()).collect();
        debug!(
            "Emitting login event for {} to {} listener(s)",
            event.identity.username,
            snapshot.len()
        );
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for LoginEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
