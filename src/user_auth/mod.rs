//! Credential Manager
//!
//! Registration and login against salted SHA-256 password digests. A
//! successful call opens a server-side session handed out as a signed
//! cookie.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod repository;
pub mod service;

pub use error::AuthError;
pub use middleware::{AuthenticatedUser, session_auth_middleware};
pub use repository::{CredentialRepository, SignUpOutcome};
pub use service::{AuthRequest, CredentialManager, SaltedHasher};
