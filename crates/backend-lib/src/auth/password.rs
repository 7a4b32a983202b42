// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Two schemes are supported. `scrypt` produces salted PHC strings and is
//! the default. `checksum` is the unsalted 32-bit fold used by accounts
//! created before scrypt was introduced; its hashes compare by equality.
use std::sync::Arc;

use scrypt::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use password_hash::rand_core::OsRng;
use serde::{Deserialize, Serialize};

/// Default scrypt cost parameter (`N = 2^15`)
pub const DEFAULT_SCRYPT_LOG_N: u8 = 15;

/// Which hashing scheme new passwords are stored with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordScheme {
    Scrypt,
    Checksum,
}

/// One-way transform of a plaintext credential
pub trait CredentialHasher: Send + Sync {
    /// Produce the stored form of `plain`
    fn hash(&self, plain: &str) -> anyhow::Result<String>;

    /// Check `plain` against a stored hash
    fn verify(&self, hash: &str, plain: &str) -> bool;

    fn scheme(&self) -> PasswordScheme;
}

/// Salted scrypt hashing with PHC string output
pub struct ScryptHasher {
    params: Params,
}

impl ScryptHasher {
    pub fn new(log_n: u8) -> anyhow::Result<Self> {
        let params = Params::new(log_n, Params::RECOMMENDED_R, Params::RECOMMENDED_P, Params::RECOMMENDED_LEN)
            .map_err(|e| anyhow::anyhow!("invalid scrypt parameters: {e}"))?;
        Ok(Self { params })
    }
}

impl CredentialHasher for ScryptHasher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params, &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, hash: &str, plain: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }

    fn scheme(&self) -> PasswordScheme {
        PasswordScheme::Scrypt
    }
}

/// Deterministic, unsalted 32-bit string fold
pub struct ChecksumHasher;

impl CredentialHasher for ChecksumHasher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        Ok(checksum(plain).to_string())
    }

    fn verify(&self, hash: &str, plain: &str) -> bool {
        checksum(plain).to_string() == hash
    }

    fn scheme(&self) -> PasswordScheme {
        PasswordScheme::Checksum
    }
}

/// `h = h * 31 + c` over UTF-16 code units, wrapping at 32 bits
pub fn checksum(plain: &str) -> i32 {
    plain.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Build the hasher for `scheme`
pub fn hasher_for(scheme: PasswordScheme, scrypt_log_n: u8) -> anyhow::Result<Arc<dyn CredentialHasher>> {
    Ok(match scheme {
        PasswordScheme::Scrypt => Arc::new(ScryptHasher::new(scrypt_log_n)?),
        PasswordScheme::Checksum => Arc::new(ChecksumHasher),
    })
}
