// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality of the session-cookie auth demo server.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod seed;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{hasher_for, AuthService, DefaultAuth, SessionManager};
use crate::config::Settings;
use crate::error::AppError;
use crate::storage::Storage;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState<S> {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Session manager
    pub sessions: SessionManager<S>,
    /// Loaded settings
    pub settings: Arc<Settings>,
    /// Storage backend
    pub storage: S,
}

impl<S: Storage> AppState<S> {
    /// Create a new application state
    pub fn new(storage: S, settings: Settings) -> Result<Self, AppError> {
        let hasher = hasher_for(settings.password.scheme, settings.password.scrypt_log_n)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let sessions = SessionManager::new(storage.clone(), settings.session_ttl());
        let auth = Arc::new(DefaultAuth::new(storage.clone(), sessions.clone(), hasher));

        Ok(Self {
            auth,
            sessions,
            settings: Arc::new(settings),
            storage,
        })
    }
}
