// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::task::JoinHandle;

use crate::metrics::{SESSION_CREATED, SESSION_DESTROYED, SESSION_EXPIRED};
use crate::storage::{SessionStore, StoreResult, UserId};

/// Session manager layering expiry on top of a [`SessionStore`]
#[derive(Clone)]
pub struct SessionManager<S> {
    store: S,
    ttl: Option<Duration>,
}

impl<S: SessionStore + Clone + 'static> SessionManager<S> {
    /// Create a session manager. With `ttl = None` sessions live until logout.
    pub fn new(store: S, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Start a session for `user_id` and return its token
    pub async fn create(&self, user_id: &UserId) -> StoreResult<String> {
        let expires_at = expiry_from(Utc::now(), self.ttl);
        let token = self.store.create_session(user_id, expires_at).await?;

        counter!(SESSION_CREATED).increment(1);
        tracing::info!(user_id = %user_id, "session created");

        Ok(token)
    }

    /// Resolve a token to the owning user. Unknown and expired tokens
    /// resolve to `None`; expired records are removed on the way.
    pub async fn resolve(&self, token: &str) -> StoreResult<Option<UserId>> {
        let Some(session) = self.store.find_session(token).await? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            self.store.delete_session(token).await?;
            counter!(SESSION_EXPIRED).increment(1);
            tracing::debug!(user_id = %session.user_id, "expired session presented");
            return Ok(None);
        }

        Ok(Some(session.user_id))
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn destroy(&self, token: &str) -> StoreResult<()> {
        self.store.delete_session(token).await?;
        counter!(SESSION_DESTROYED).increment(1);
        Ok(())
    }

    /// Remove every expired session now
    pub async fn purge_expired(&self) -> StoreResult<usize> {
        let removed = self.store.purge_expired(Utc::now()).await?;
        if removed > 0 {
            counter!(SESSION_EXPIRED).increment(removed as u64);
            tracing::info!(removed, "expired sessions purged");
        }
        Ok(removed)
    }

    /// Spawn the task that periodically purges expired sessions.
    /// Returns `None` when sessions never expire.
    pub fn spawn_cleanup_task(&self, interval: Duration) -> Option<JoinHandle<()>> {
        self.ttl?;
        let manager = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = manager.purge_expired().await {
                    tracing::warn!(error = %e, "session cleanup failed");
                }
            }
        }))
    }
}

/// `now + ttl`, or `None` for sessions that never expire
pub fn expiry_from(now: DateTime<Utc>, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl?).ok()?;
    now.checked_add_signed(ttl)
}
