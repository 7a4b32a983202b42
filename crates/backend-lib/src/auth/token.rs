// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Session tokens.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// Random bytes behind every session token
pub const SESSION_TOKEN_BYTES: usize = 32;

/// A fresh bearer token for the `sessionId` cookie.
///
/// Drawn from the thread-local CSPRNG and encoded as unpadded base64url, so
/// it needs no quoting inside a cookie.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
