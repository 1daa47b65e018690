//! In-memory store for in-flight login attempts.
//!
//! Each entry correlates the `state` round-tripped through the identity
//! provider with the PKCE code verifier proving possession of the original
//! authorization request. Entries are consumed exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::lifetimes::{CORRELATION_TTL, SWEEP_INTERVAL};

/// One in-flight login attempt.
struct Correlation {
    code_verifier: String,
    created_at: Instant,
}

impl Correlation {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= CORRELATION_TTL
    }
}

/// In-memory OAuth correlation store.
///
/// Shared mutable state across all in-flight requests; entries are only
/// touched under the write lock and the lock is never held across a
/// network await.
#[derive(Clone, Default)]
pub struct CorrelationStore {
    entries: Arc<RwLock<HashMap<String, Correlation>>>,
}

impl CorrelationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new login attempt keyed by its `state`.
    pub async fn insert(&self, state: String, code_verifier: String) {
        self.entries
            .write()
            .await
            .insert(state, Correlation { code_verifier, created_at: Instant::now() });
    }

    /// Consume a correlation by `state` (one-time use).
    ///
    /// Returns the stored code verifier if the state was known and fresh.
    /// The entry is removed regardless, so a concurrent or replayed
    /// callback presenting the same `state` observes "not found".
    pub async fn consume(&self, state: &str) -> Option<String> {
        let entry = self.entries.write().await.remove(state)?;
        if entry.is_expired() {
            return None;
        }
        Some(entry.code_verifier)
    }

    /// Number of live entries (expired ones may still be counted until swept).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Start the background sweep removing expired entries.
    ///
    /// Lazy removal in [`Self::consume`] carries correctness; the sweep only
    /// bounds memory for attempts that never reach the callback.
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
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(count = removed, "swept expired login correlations");
        }
    }
}

impl std::fmt::Debug for CorrelationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationStore").finish()
    }
}
