// crates/backend-lib/src/middleware/mod.rs

//! Request middleware for the auth demo server.

pub mod session;

pub use session::{resolve_session, AuthContext};
