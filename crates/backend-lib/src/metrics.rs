// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_DESTROYED: &str = "session.destroyed";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const LOGIN_FAILED: &str = "auth.login.failed";
pub const SIGNUP_REJECTED: &str = "auth.signup.rejected";
pub const USER_CREATED: &str = "user.created";
