use async_trait::async_trait;
use authdemo_common::Credentials;

use crate::error::AppError;
use crate::storage::User;

/// Result of a login or signup attempt
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// Credentials accepted and a session started
    Authenticated { user: User, token: String },
    /// Credentials refused, for whatever reason
    Rejected,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials and start a session
    async fn login(&self, credentials: Credentials) -> Result<AuthOutcome, AppError>;

    /// Register a new account and start a session
    async fn signup(&self, credentials: Credentials) -> Result<AuthOutcome, AppError>;

    /// End the session identified by `token`. Unknown tokens are ignored.
    async fn logout(&self, token: &str) -> Result<(), AppError>;

    /// Resolve a session token to its user
    async fn resolve(&self, token: &str) -> Result<Option<User>, AppError>;
}
