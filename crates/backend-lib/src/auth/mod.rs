// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod session;
pub mod token;
mod service;
mod service_impl;

pub use password::{
    checksum, hasher_for, ChecksumHasher, CredentialHasher, PasswordScheme, ScryptHasher,
    DEFAULT_SCRYPT_LOG_N,
};
pub use service::{AuthOutcome, AuthService};
pub use service_impl::DefaultAuth;
pub use session::SessionManager;
