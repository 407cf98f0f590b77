//! Session Manager
//!
//! Server-side sessions keyed by an opaque random token, handed to clients
//! in an HMAC-signed cookie.

pub mod cookie;
pub mod store;

pub use cookie::{CookieError, CookieSigner, SESSION_COOKIE_NAME};
pub use store::{SessionStore, SessionToken, SweeperHandle, spawn_sweeper};
