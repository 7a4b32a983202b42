use std::sync::Arc;

use async_trait::async_trait;
use authdemo_common::Credentials;
use metrics::counter;
use zeroize::Zeroize;

use super::{AuthOutcome, AuthService, CredentialHasher, SessionManager};
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, SIGNUP_REJECTED, USER_CREATED};
use crate::storage::{NewUser, Storage, StoreError, User};
use crate::validation::{validate_password, validate_username};

/// Auth service over any [`Storage`] backend
pub struct DefaultAuth<S> {
    storage: S,
    sessions: SessionManager<S>,
    hasher: Arc<dyn CredentialHasher>,
}

impl<S: Storage> DefaultAuth<S> {
    pub fn new(storage: S, sessions: SessionManager<S>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            storage,
            sessions,
            hasher,
        }
    }

    /// Hash on the blocking pool; the plaintext is wiped afterwards
    async fn hash(&self, mut plain: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || {
            let hash = hasher.hash(&plain);
            plain.zeroize();
            hash
        })
        .await?;
        hash.map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn verify(&self, hash: String, mut plain: String) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        let ok = tokio::task::spawn_blocking(move || {
            let ok = hasher.verify(&hash, &plain);
            plain.zeroize();
            ok
        })
        .await?;
        Ok(ok)
    }

    async fn start_session(&self, user: User) -> Result<AuthOutcome, AppError> {
        let token = self.sessions.create(&user.id).await?;
        Ok(AuthOutcome::Authenticated { user, token })
    }
}

fn well_formed(credentials: &Credentials) -> bool {
    validate_username(&credentials.username).is_ok()
        && validate_password(&credentials.password).is_ok()
}

fn discard(mut secret: String) {
    secret.zeroize();
}

#[async_trait]
impl<S: Storage> AuthService for DefaultAuth<S> {
    async fn login(&self, credentials: Credentials) -> Result<AuthOutcome, AppError> {
        if !well_formed(&credentials) {
            discard(credentials.password);
            counter!(LOGIN_FAILED).increment(1);
            return Ok(AuthOutcome::Rejected);
        }

        let Credentials { username, password } = credentials;
        let Some(user) = self.storage.find_by_username(&username).await? else {
            discard(password);
            counter!(LOGIN_FAILED).increment(1);
            tracing::warn!(%username, "login rejected");
            return Ok(AuthOutcome::Rejected);
        };

        if !self.verify(user.password_hash.clone(), password).await? {
            counter!(LOGIN_FAILED).increment(1);
            tracing::warn!(%username, "login rejected");
            return Ok(AuthOutcome::Rejected);
        }

        self.start_session(user).await
    }

    async fn signup(&self, credentials: Credentials) -> Result<AuthOutcome, AppError> {
        if !well_formed(&credentials) {
            discard(credentials.password);
            counter!(SIGNUP_REJECTED).increment(1);
            return Ok(AuthOutcome::Rejected);
        }

        let Credentials { username, password } = credentials;
        // cheap early exit; the store makes the final call atomically
        if self.storage.find_by_username(&username).await?.is_some() {
            discard(password);
            counter!(SIGNUP_REJECTED).increment(1);
            tracing::warn!(%username, "signup rejected");
            return Ok(AuthOutcome::Rejected);
        }

        let password_hash = self.hash(password).await?;
        let user = match self
            .storage
            .create_user(NewUser {
                username: username.clone(),
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(StoreError::UsernameTaken) => {
                counter!(SIGNUP_REJECTED).increment(1);
                tracing::warn!(%username, "signup lost a race for the username");
                return Ok(AuthOutcome::Rejected);
            },
            Err(e) => return Err(e.into()),
        };

        counter!(USER_CREATED).increment(1);
        tracing::info!(%username, user_id = %user.id, "user created");
        self.start_session(user).await
    }

    async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.sessions.destroy(token).await?;
        tracing::info!("session destroyed");
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Option<User>, AppError> {
        let Some(user_id) = self.sessions.resolve(token).await? else {
            return Ok(None);
        };

        let user = self.storage.find_by_id(&user_id).await?;
        if user.is_none() {
            tracing::debug!(%user_id, "session references a missing user");
        }
        Ok(user)
    }
}
