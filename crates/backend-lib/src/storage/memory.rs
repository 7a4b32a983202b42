// ============================
// crates/backend-lib/src/storage/memory.rs
// ============================
//! Process-local storage backend.
//!
//! Nothing survives a restart. Usernames are reserved through a separate
//! index map so that the uniqueness check and the insert are one atomic
//! `entry` operation.
use std::sync::Arc;

use async_trait::async_trait;
use authdemo_common::{Profile, ProfileFields, ProfileFilter, Timer};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    Counter, NewUser, ProfileStore, SessionRecord, SessionStore, StoreError, StoreResult,
    TimerStore, User, UserId, UserStore,
};
use crate::auth::token::new_session_token;

#[derive(Default)]
struct Inner {
    users: DashMap<UserId, User>,
    usernames: DashMap<String, UserId>,
    sessions: DashMap<String, SessionRecord>,
    timers: RwLock<Vec<Timer>>,
    profiles: RwLock<Vec<Profile>>,
}

/// In-memory implementation of the store traits
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live session records, expired or not
    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let Some(id) = self.inner.usernames.get(username).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.inner.users.get(&id).map(|user| user.clone()))
    }

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.inner.users.get(id).map(|user| user.clone()))
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        match self.inner.usernames.entry(new_user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::UsernameTaken),
            Entry::Vacant(slot) => {
                let user = User {
                    id: UserId::new(new_id()),
                    username: new_user.username,
                    password_hash: new_user.password_hash,
                    books: 0,
                };
                // the user row goes in before the index entry is released
                self.inner.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(user)
            },
        }
    }

    async fn increment_counter(&self, id: &UserId, counter: Counter) -> StoreResult<Option<i64>> {
        let Some(mut user) = self.inner.users.get_mut(id) else {
            return Ok(None);
        };
        let value = match counter {
            Counter::Books => {
                user.books += 1;
                user.books
            },
        };
        Ok(Some(value))
    }
}

#[async_trait]
impl SessionStore for MemoryStorage {
    async fn create_session(
        &self,
        user_id: &UserId,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<String> {
        loop {
            let token = new_session_token();
            if let Entry::Vacant(slot) = self.inner.sessions.entry(token.clone()) {
                slot.insert(SessionRecord {
                    token: token.clone(),
                    user_id: user_id.clone(),
                    created_at: Utc::now(),
                    expires_at,
                });
                return Ok(token);
            }
        }
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<SessionRecord>> {
        Ok(self.inner.sessions.get(token).map(|s| s.clone()))
    }

    async fn delete_session(&self, token: &str) -> StoreResult<()> {
        self.inner.sessions.remove(token);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let before = self.inner.sessions.len();
        self.inner.sessions.retain(|_, session| !session.is_expired(now));
        Ok(before.saturating_sub(self.inner.sessions.len()))
    }
}

#[async_trait]
impl TimerStore for MemoryStorage {
    async fn list_timers(&self, is_active: bool) -> StoreResult<Vec<Timer>> {
        let timers = self.inner.timers.read();
        Ok(timers
            .iter()
            .filter(|t| t.is_active == is_active)
            .cloned()
            .collect())
    }

    async fn create_timer(&self, description: String) -> StoreResult<Timer> {
        let timer = Timer {
            id: new_id(),
            start: Utc::now(),
            end: None,
            is_active: true,
            duration: None,
            description,
        };
        self.inner.timers.write().push(timer.clone());
        Ok(timer)
    }

    async fn insert_timer(&self, mut timer: Timer) -> StoreResult<Timer> {
        timer.id = new_id();
        self.inner.timers.write().push(timer.clone());
        Ok(timer)
    }

    async fn stop_timer(&self, id: &str, now: DateTime<Utc>) -> StoreResult<Option<Timer>> {
        let mut timers = self.inner.timers.write();
        Ok(timers.iter_mut().find(|t| t.id == id).map(|timer| {
            timer.stop(now);
            timer.clone()
        }))
    }

    async fn count_timers(&self) -> StoreResult<usize> {
        Ok(self.inner.timers.read().len())
    }
}

#[async_trait]
impl ProfileStore for MemoryStorage {
    async fn list_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>> {
        let profiles = self.inner.profiles.read();
        Ok(profiles.iter().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        let profiles = self.inner.profiles.read();
        Ok(profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn create_profile(&self, fields: ProfileFields) -> StoreResult<String> {
        let id = new_id();
        self.inner
            .profiles
            .write()
            .push(fields.into_profile(id.clone()));
        Ok(id)
    }

    async fn update_profile(&self, id: &str, fields: ProfileFields) -> StoreResult<bool> {
        let mut profiles = self.inner.profiles.write();
        match profiles.iter_mut().find(|p| p.id == id) {
            Some(profile) => {
                fields.apply_to(profile);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn delete_profile(&self, id: &str) -> StoreResult<bool> {
        let mut profiles = self.inner.profiles.write();
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        Ok(profiles.len() != before)
    }
}
