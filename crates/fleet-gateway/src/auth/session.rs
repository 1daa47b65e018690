//! Session model and store.
//!
//! A session links an opaque client-held identifier to the provider access
//! token and its expiry. The store is the only owner of session lifetime;
//! handlers borrow a clone for the duration of one request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::lifetimes::SWEEP_INTERVAL;

/// One authenticated user's continuity across requests.
#[derive(Clone)]
pub struct Session {
    /// Bearer token for upstream API calls.
    pub access_token: String,
    /// Refresh token, if the provider issued one. Stored but never
    /// exercised: expiry is a hard session boundary requiring fresh login.
    pub refresh_token: Option<String>,
    /// Stable identifier from the provider profile.
    pub user_id: String,
    /// Absolute expiry derived from the token exchange's advertised lifetime.
    pub expires_at: Instant,
}

impl Session {
    /// Create a session valid for `lifetime` from now.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        user_id: String,
        lifetime: Duration,
    ) -> Self {
        Self { access_token, refresh_token, user_id, expires_at: Instant::now() + lifetime }
    }

    /// A session is either valid or treated as non-existent.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Tokens never appear in logs.
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session store contract.
///
/// The in-memory implementation below is the single-process default; the
/// contract isolates it so a durable backend can be swapped in without
/// touching the coordinator or the authentication gate.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a session under a caller-generated unique identifier.
    async fn create(&self, session_id: String, session: Session);

    /// Look up a live session.
    ///
    /// An expired session is indistinguishable from an absent one; the
    /// implementation removes the expired entry as a side effect.
    async fn get(&self, session_id: &str) -> Option<Session>;

    /// Remove a session. Removing an unknown id is a no-op.
    async fn delete(&self, session_id: &str);
}

/// In-memory session store.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until evicted.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Start the background sweep removing expired sessions.
    ///
    /// Lazy eviction in `get` carries correctness; the sweep bounds memory
    /// for sessions that are never presented again.
    pub fn start_sweep_task(self) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                self.sweep_expired().await;
            }
        });
    }

    async fn sweep_expired(&self) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(count = removed, "swept expired sessions");
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session_id: String, session: Session) {
        self.sessions.write().await.insert(session_id, session);
    }

    async fn get(&self, session_id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(session_id) {
            Some(session) if session.is_expired() => {
                // Lazy eviction: the expired entry must not be retrievable
                // by any subsequent get.
                sessions.remove(session_id);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    async fn delete(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }
}

impl std::fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStore").finish()
    }
}
