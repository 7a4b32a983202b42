// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! Storage abstraction with in-memory, flat-file and SQLite implementations.
//!
//! Every backend implements the same four store traits, so handlers are
//! written once against [`Storage`] and the backend is picked at startup.
use std::fmt;

use async_trait::async_trait;
use authdemo_common::{Profile, ProfileFields, ProfileFilter, Timer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod flat_file;
pub mod memory;
pub mod sqlite;

pub use flat_file::FlatFileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Errors raised by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque user identifier assigned by the store
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub books: i64,
}

/// Fields needed to register an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

/// Per-user counters that can be bumped in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Books,
}

impl Counter {
    pub fn column(self) -> &'static str {
        match self {
            Counter::Books => "books",
        }
    }
}

/// Server-side half of a login session
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    /// `None` means the session lives until logout
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Account records keyed by username
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account by its username
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Look up an account by id
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Insert a new account. The uniqueness check and the insert happen as
    /// one step: a taken username yields [`StoreError::UsernameTaken`].
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    /// Atomically add one to `counter`, returning the new value, or `None`
    /// when the user does not exist.
    async fn increment_counter(&self, id: &UserId, counter: Counter) -> StoreResult<Option<i64>>;
}

/// Mapping from session token to user
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a fresh session for `user_id` and return its token
    async fn create_session(
        &self,
        user_id: &UserId,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<String>;

    /// Look up a session by token
    async fn find_session(&self, token: &str) -> StoreResult<Option<SessionRecord>>;

    /// Remove a session. Unknown tokens are not an error.
    async fn delete_session(&self, token: &str) -> StoreResult<()>;

    /// Remove every session that expired at or before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize>;
}

/// Stopwatch timers
#[async_trait]
pub trait TimerStore: Send + Sync {
    async fn list_timers(&self, is_active: bool) -> StoreResult<Vec<Timer>>;

    /// Start a new timer now
    async fn create_timer(&self, description: String) -> StoreResult<Timer>;

    /// Insert a fully-formed timer, keeping its timestamps. Used for seeding.
    async fn insert_timer(&self, timer: Timer) -> StoreResult<Timer>;

    /// Stop a running timer. `None` when the id is unknown.
    async fn stop_timer(&self, id: &str, now: DateTime<Utc>) -> StoreResult<Option<Timer>>;

    async fn count_timers(&self) -> StoreResult<usize>;
}

/// Records behind the generic `/api/users` router
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>>;

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>>;

    /// Insert and return the new id
    async fn create_profile(&self, fields: ProfileFields) -> StoreResult<String>;

    /// `false` when the id is unknown
    async fn update_profile(&self, id: &str, fields: ProfileFields) -> StoreResult<bool>;

    /// `false` when the id is unknown
    async fn delete_profile(&self, id: &str) -> StoreResult<bool>;
}

/// Everything a request handler needs from a backend
pub trait Storage:
    UserStore + SessionStore + TimerStore + ProfileStore + Clone + Send + Sync + 'static
{
}

impl<T> Storage for T where
    T: UserStore + SessionStore + TimerStore + ProfileStore + Clone + Send + Sync + 'static
{
}
