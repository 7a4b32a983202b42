// ============================
// crates/backend-lib/src/seed.rs
// ============================
//! Demo data: the `admin` account and two timers.
use authdemo_common::Timer;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::CredentialHasher;
use crate::error::AppError;
use crate::storage::{NewUser, Storage, StoreError};

pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "pwd007";

/// Create the demo account unless it exists, and the demo timers when
/// there are no timers yet. Safe to run on every start.
pub async fn seed_demo_data<S: Storage>(
    storage: &S,
    hasher: &dyn CredentialHasher,
) -> Result<(), AppError> {
    if storage.find_by_username(DEMO_USERNAME).await?.is_none() {
        let password_hash = hasher
            .hash(DEMO_PASSWORD)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        match storage
            .create_user(NewUser {
                username: DEMO_USERNAME.to_string(),
                password_hash,
            })
            .await
        {
            Ok(user) => tracing::info!(user_id = %user.id, "demo account created"),
            Err(StoreError::UsernameTaken) => {},
            Err(e) => return Err(e.into()),
        }
    }

    if storage.count_timers().await? == 0 {
        let now = Utc::now();
        storage
            .insert_timer(Timer {
                id: Uuid::new_v4().to_string(),
                start: now,
                end: None,
                is_active: true,
                duration: None,
                description: "Timer 1".to_string(),
            })
            .await?;
        storage
            .insert_timer(Timer {
                id: Uuid::new_v4().to_string(),
                start: now - Duration::milliseconds(5000),
                end: Some(now - Duration::milliseconds(3000)),
                is_active: false,
                duration: Some(2000),
                description: "Timer 0".to_string(),
            })
            .await?;
        tracing::info!("demo timers created");
    }

    Ok(())
}
