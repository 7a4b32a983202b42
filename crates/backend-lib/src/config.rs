// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::{PasswordScheme, DEFAULT_SCRYPT_LOG_N};

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "authdemo.toml";

/// Prefix of the environment variables that override the config file
pub const ENV_PREFIX: &str = "AUTHDEMO_";

/// Longest accepted session lifetime (ten years)
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Create the demo account and timers at startup
    pub seed_demo_data: bool,
    pub storage: StorageSettings,
    pub session: SessionSettings,
    pub password: PasswordSettings,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Json,
}

/// Which store implementation backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    FlatFile,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Directory of the JSON documents (`flat_file` backend)
    pub data_dir: PathBuf,
    /// Connection URL (`sqlite` backend)
    pub database_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Session lifetime in seconds. Unset means sessions live until logout.
    pub ttl_secs: Option<u64>,
    /// How often expired sessions are swept
    pub cleanup_interval_secs: u64,
    /// Mark the cookie `Secure` and `SameSite=Lax`
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    pub scheme: PasswordScheme,
    pub scrypt_log_n: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            seed_demo_data: true,
            storage: StorageSettings::default(),
            session: SessionSettings::default(),
            password: PasswordSettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("data"),
            database_url: "sqlite://authdemo.db".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            cleanup_interval_secs: 60,
            secure_cookie: false,
        }
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            scheme: PasswordScheme::Scrypt,
            scrypt_log_n: DEFAULT_SCRYPT_LOG_N,
        }
    }
}

impl Settings {
    /// Layered sources: defaults, then the TOML file, then `AUTHDEMO_*`
    /// environment variables (`__` separates nested keys).
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load settings from [`DEFAULT_CONFIG_FILE`] and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from `path` and the environment. A missing file is
    /// not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Settings = Self::figment(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("Invalid log level: {}", self.log_level);
        }

        if self.session.ttl_secs == Some(0) {
            bail!("Session TTL must be greater than 0");
        }

        if let Some(ttl) = self.session.ttl_secs.filter(|&ttl| ttl > MAX_SESSION_TTL_SECS) {
            bail!("Session TTL cannot exceed {MAX_SESSION_TTL_SECS} seconds, got {ttl}");
        }

        if self.session.cleanup_interval_secs == 0 {
            bail!("Session cleanup interval must be greater than 0");
        }

        // scrypt requires log_n < r * 16 with r = 8
        if !(1..=20).contains(&self.password.scrypt_log_n) {
            bail!(
                "scrypt_log_n must be between 1 and 20, got {}",
                self.password.scrypt_log_n
            );
        }

        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.database_url.trim().is_empty()
        {
            bail!("database_url is required for the sqlite backend");
        }

        Ok(())
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        self.session.ttl_secs.map(Duration::from_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.session.cleanup_interval_secs)
    }
}
