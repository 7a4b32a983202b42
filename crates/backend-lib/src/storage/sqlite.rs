// ============================
// crates/backend-lib/src/storage/sqlite.rs
// ============================
//! Relational storage backed by SQLite through `sqlx`.
//!
//! ## Schema
//!
//! ```sql
//! users(id, username UNIQUE, password, books)
//! sessions(id, user_id -> users.id, session_id UNIQUE, created_at, expires_at)
//! timers(id, start, "end", is_active, duration, description)
//! profiles(id, name, age, country)
//! ```
//!
//! Timestamps are stored as epoch milliseconds. Ids are integer primary keys
//! handed out as strings; an id that does not parse as an integer is simply
//! unknown.
use std::str::FromStr;

use async_trait::async_trait;
use authdemo_common::{Profile, ProfileFields, ProfileFilter, Timer};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, QueryBuilder, Sqlite, SqlitePool,
};

use super::{
    Counter, NewUser, ProfileStore, SessionRecord, SessionStore, StoreError, StoreResult,
    TimerStore, User, UserId, UserStore,
};
use crate::auth::token::new_session_token;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        books INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        session_id TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL,
        expires_at INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)",
    "CREATE TABLE IF NOT EXISTS timers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        start INTEGER NOT NULL,
        \"end\" INTEGER,
        is_active BOOLEAN NOT NULL,
        duration INTEGER,
        description TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS profiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        age INTEGER,
        country TEXT
    )",
];

const SESSION_INSERT_ATTEMPTS: usize = 3;

/// SQLite implementation of the store traits
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Connect to `database_url` (e.g. `sqlite://authdemo.db` or
    /// `sqlite::memory:`) and create the schema if needed.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // an in-memory database lives and dies with its single connection
        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    books: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id.to_string()),
            username: row.username,
            password_hash: row.password,
            books: row.books,
        }
    }
}

#[derive(FromRow)]
struct SessionRow {
    user_id: i64,
    session_id: String,
    created_at: i64,
    expires_at: Option<i64>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        SessionRecord {
            token: row.session_id,
            user_id: UserId::new(row.user_id.to_string()),
            created_at: from_millis(row.created_at),
            expires_at: row.expires_at.map(from_millis),
        }
    }
}

#[derive(FromRow)]
struct TimerRow {
    id: i64,
    start: i64,
    end: Option<i64>,
    is_active: bool,
    duration: Option<i64>,
    description: String,
}

impl From<TimerRow> for Timer {
    fn from(row: TimerRow) -> Self {
        Timer {
            id: row.id.to_string(),
            start: from_millis(row.start),
            end: row.end.map(from_millis),
            is_active: row.is_active,
            duration: row.duration,
            description: row.description,
        }
    }
}

#[derive(FromRow)]
struct ProfileRow {
    id: i64,
    name: Option<String>,
    age: Option<i64>,
    country: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id.to_string(),
            name: row.name,
            age: row.age,
            country: row.country,
        }
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn parse_id(id: &str) -> Option<i64> {
    id.parse().ok()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

const TIMER_COLUMNS: &str = "SELECT id, start, \"end\", is_active, duration, description FROM timers";

#[async_trait]
impl UserStore for SqliteStorage {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password, books FROM users WHERE username = ? LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        let Some(id) = parse_id(id.as_str()) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password, books FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let result = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, password) VALUES (?, ?)
             RETURNING id, username, password, books",
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    async fn increment_counter(&self, id: &UserId, counter: Counter) -> StoreResult<Option<i64>> {
        let Some(id) = parse_id(id.as_str()) else {
            return Ok(None);
        };
        // the column name comes from a closed enum, never from input
        let column = counter.column();
        let sql = format!("UPDATE users SET {column} = {column} + 1 WHERE id = ? RETURNING {column}");
        let value = sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }
}

#[async_trait]
impl SessionStore for SqliteStorage {
    async fn create_session(
        &self,
        user_id: &UserId,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<String> {
        let user_id = parse_id(user_id.as_str()).ok_or(sqlx::Error::RowNotFound)?;
        let now = Utc::now().timestamp_millis();
        let expires = expires_at.map(|at| at.timestamp_millis());

        let mut attempt = 0;
        loop {
            attempt += 1;
            let token = new_session_token();
            let result = sqlx::query(
                "INSERT INTO sessions (user_id, session_id, created_at, expires_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(&token)
            .bind(now)
            .bind(expires)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => return Ok(token),
                Err(e) if is_unique_violation(&e) && attempt < SESSION_INSERT_ATTEMPTS => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT user_id, session_id, created_at, expires_at FROM sessions WHERE session_id = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SessionRecord::from))
    }

    async fn delete_session(&self, token: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}

#[async_trait]
impl TimerStore for SqliteStorage {
    async fn list_timers(&self, is_active: bool) -> StoreResult<Vec<Timer>> {
        let sql = format!("{TIMER_COLUMNS} WHERE is_active = ? ORDER BY id");
        let rows = sqlx::query_as::<_, TimerRow>(&sql)
            .bind(is_active)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Timer::from).collect())
    }

    async fn create_timer(&self, description: String) -> StoreResult<Timer> {
        self.insert_timer(Timer {
            id: String::new(),
            start: Utc::now(),
            end: None,
            is_active: true,
            duration: None,
            description,
        })
        .await
    }

    async fn insert_timer(&self, timer: Timer) -> StoreResult<Timer> {
        let row = sqlx::query_as::<_, TimerRow>(
            "INSERT INTO timers (start, \"end\", is_active, duration, description)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, start, \"end\", is_active, duration, description",
        )
        .bind(timer.start.timestamp_millis())
        .bind(timer.end.map(|end| end.timestamp_millis()))
        .bind(timer.is_active)
        .bind(timer.duration)
        .bind(&timer.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn stop_timer(&self, id: &str, now: DateTime<Utc>) -> StoreResult<Option<Timer>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let now = now.timestamp_millis();
        sqlx::query(
            "UPDATE timers SET is_active = 0, \"end\" = ?, duration = ? - start
             WHERE id = ? AND is_active = 1",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        let sql = format!("{TIMER_COLUMNS} WHERE id = ?");
        let row = sqlx::query_as::<_, TimerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Timer::from))
    }

    async fn count_timers(&self) -> StoreResult<usize> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM timers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl ProfileStore for SqliteStorage {
    async fn list_profiles(&self, filter: &ProfileFilter) -> StoreResult<Vec<Profile>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, name, age, country FROM profiles WHERE 1 = 1");
        if let Some(name) = &filter.name {
            query.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(age) = filter.age {
            query.push(" AND age = ").push_bind(age);
        }
        if let Some(country) = &filter.country {
            query.push(" AND country = ").push_bind(country.clone());
        }
        query.push(" ORDER BY id");

        let rows = query
            .build_query_as::<ProfileRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, name, age, country FROM profiles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Profile::from))
    }

    async fn create_profile(&self, fields: ProfileFields) -> StoreResult<String> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO profiles (name, age, country) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(fields.name)
        .bind(fields.age)
        .bind(fields.country)
        .fetch_one(&self.pool)
        .await?;
        Ok(id.to_string())
    }

    async fn update_profile(&self, id: &str, fields: ProfileFields) -> StoreResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        if fields.is_empty() {
            return Ok(self.get_profile(&id.to_string()).await?.is_some());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE profiles SET ");
        let mut assignments = query.separated(", ");
        if let Some(name) = fields.name {
            assignments.push("name = ").push_bind_unseparated(name);
        }
        if let Some(age) = fields.age {
            assignments.push("age = ").push_bind_unseparated(age);
        }
        if let Some(country) = fields.country {
            assignments.push("country = ").push_bind_unseparated(country);
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_profile(&self, id: &str) -> StoreResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
