// ============================
// crates/backend-lib/src/storage/flat_file.rs
// ============================
//! Document storage on the local filesystem.
//!
//! Each collection is one JSON document under the root directory
//! (`users.json`, `sessions.json`, `timers.json`, `profiles.json`).
//! Every operation is a read-modify-write of one document under a single
//! async mutex, and documents are replaced with write-to-temp + rename so
//! a crash never leaves a half-written file behind.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use authdemo_common::{Profile, ProfileFields, ProfileFilter, Timer};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs as tokio_fs, sync::Mutex};
use uuid::Uuid;

use super::{
    Counter, NewUser, ProfileStore, SessionRecord, SessionStore, StoreError, StoreResult,
    TimerStore, User, UserId, UserStore,
};
use crate::auth::token::new_session_token;

const USERS: &str = "users.json";
const SESSIONS: &str = "sessions.json";
const TIMERS: &str = "timers.json";
const PROFILES: &str = "profiles.json";

/// Flat-file implementation of the store traits
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            lock: Arc::new(Mutex::new(())),
        })
    }

    /// Read a whole document; a missing file is an empty collection
    async fn load<T: DeserializeOwned + Default>(&self, name: &str) -> StoreResult<T> {
        let path = self.root.join(name);
        match tokio_fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Ok(T::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Replace a whole document
    async fn save<T: Serialize>(&self, name: &str, value: &T) -> StoreResult<()> {
        let path = self.root.join(name);
        let tmp = self.root.join(format!("{name}.tmp"));
        let json = serde_json::to_string_pretty(value)?;
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
impl UserStore for FlatFileStorage {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let _guard = self.lock.lock().await;
        let users: Vec<User> = self.load(USERS).await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        let _guard = self.lock.lock().await;
        let users: Vec<User> = self.load(USERS).await?;
        Ok(users.into_iter().find(|u| &u.id == id))
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let _guard = self.lock.lock().await;
        let mut users: Vec<User> = self.load(USERS).await?;
        if users.iter().any(|u| u.username == new_user.username) {
            return Err(StoreError::UsernameTaken);
        }

        let user = User {
            id: UserId::new(new_id()),
            username: new_user.username,
            password_hash: new_user.password_hash,
            books: 0,
        };
        users.push(user.clone());
        self.save(USERS, &users).await?;
        Ok(user)
    }

    async fn increment_counter(&self, id: &UserId, counter: Counter) -> StoreResult<Option<i64>> {
        let _guard = self.lock.lock().await;
        let mut users: Vec<User> = self.load(USERS).await?;
        let Some(user) = users.iter_mut().find(|u| &u.id == id) else {
            return Ok(None);
        };
        let value = match counter {
            Counter::Books => {
                user.books += 1;
                user.books
            },
        };
        self.save(USERS, &users).await?;
        Ok(Some(value))
    }
}

#[async_trait]
impl SessionStore for FlatFileStorage {
    async fn create_session(
        &self,
        user_id: &UserId,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<String> {
        let _guard = self.lock.lock().await;
        let mut sessions: BTreeMap<String, SessionRecord> = self.load(SESSIONS).await?;

        let mut token = new_session_token();
        while sessions.contains_key(&token) {
            token = new_session_token();
        }

        sessions.insert(
            token.clone(),
            SessionRecord {
                token: token.clone(),
                user_id: user_id.clone(),
                created_at: Utc::now(),
                expires_at,
            },
        );
        self.save(SESSIONS, &sessions).await?;
        Ok(token)
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<SessionRecord>> {
        let _guard = self.lock.lock().await;
        let mut sessions: BTreeMap<String, SessionRecord> = self.load(SESSIONS).await?;
        Ok(sessions.remove(token))
    }

    async fn delete_session(&self, token: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut sessions: BTreeMap<String, SessionRecord> = self.load(SESSIONS).await?;
        if sessions.remove(token).is_some() {
            self.save(SESSIONS, &sessions).await?;
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let _guard = self.lock.lock().await;
        let mut sessions: BTreeMap<String, SessionRecord> = self.load(SESSIONS).await?;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        let removed = before - sessions.len();
        if removed > 0 {
            self.save(SESSIONS, &sessions).await?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl TimerStore for FlatFileStorage {
    async fn list_timers(&self, is_active: bool) -> StoreResult<Vec<Timer>> {
        let _guard = self.lock.lock().await;
        let timers: Vec<Timer> = self.load(TIMERS).await?;
        Ok(timers.into_iter().filter(|t| t.is_active == is_active).collect())
    }

    async fn create_timer(&self, description: String) -> StoreResult<Timer> {
        let timer = Timer {
            id: String::new(),
            start: Utc::now(),
            end: None,
            is_active: true,
            duration: None,
            description,
        };
        self.insert_timer(timer).await
    }

    async fn insert_timer(&self, mut timer: Timer) -> StoreResult<Timer> {
        let _guard = self.lock.lock().await;
        let mut timers: Vec<Timer> = self.load(TIMERS).await?;
        timer.id = new_id();
        timers.push(timer.clone());
        self.save(TIMERS, &timers).await?;
        Ok(timer)
    }

    async fn stop_timer(&self, id: &str, now: DateTime<Utc>) -> StoreResult<Option<Timer>> {
        let _guard = self.lock.lock().await;
        let mut timers: Vec<Timer> = self.load(TIMERS).await?;
        let Some(timer) = timers.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        let was_active = timer.is_active;
        timer.stop(now);
        let timer = timer.clone();
        if was_active {
            self.save(TIMERS, &timers).await?;
        }
        Ok(Some(timer))
    }

    async fn count_timers(&self) -> StoreResult<usize> {
        let _guard = self.lock.lock().await;
        let timers: Vec<Timer> = self.load(TIMERS).await?;
        Ok(timers.len())
    }
}

#[async_trait]
impl ProfileStore for FlatFileStorage {
    async fn list_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>> {
        let _guard = self.lock.lock().await;
        let profiles: Vec<Profile> = self.load(PROFILES).await?;
        Ok(profiles.into_iter().filter(|p| filter.matches(p)).collect())
    }

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        let _guard = self.lock.lock().await;
        let profiles: Vec<Profile> = self.load(PROFILES).await?;
        Ok(profiles.into_iter().find(|p| p.id == id))
    }

    async fn create_profile(&self, fields: ProfileFields) -> StoreResult<String> {
        let _guard = self.lock.lock().await;
        let mut profiles: Vec<Profile> = self.load(PROFILES).await?;
        let id = new_id();
        profiles.push(fields.into_profile(id.clone()));
        self.save(PROFILES, &profiles).await?;
        Ok(id)
    }

    async fn update_profile(&self, id: &str, fields: ProfileFields) -> StoreResult<bool> {
        let _guard = self.lock.lock().await;
        let mut profiles: Vec<Profile> = self.load(PROFILES).await?;
        let Some(profile) = profiles.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        fields.apply_to(profile);
        self.save(PROFILES, &profiles).await?;
        Ok(true)
    }

    async fn delete_profile(&self, id: &str) -> StoreResult<bool> {
        let _guard = self.lock.lock().await;
        let mut profiles: Vec<Profile> = self.load(PROFILES).await?;
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        if profiles.len() == before {
            return Ok(false);
        }
        self.save(PROFILES, &profiles).await?;
        Ok(true)
    }
}
