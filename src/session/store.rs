//! In-memory session store.
//!
//! Maps an opaque token to the user it authenticates and a sliding expiry.
//! Every check-and-evict runs under the DashMap shard lock for that token,
//! so a concurrent refresh can never resurrect an evicted session.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::RngCore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::core_types::UserId;

/// Random bytes behind a session token
const TOKEN_BYTES: usize = 32;

pub const DEFAULT_SESSION_TTL_SECS: u64 = 120;

/// Opaque session token (hex text)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user: UserId,
    expires_at: Instant,
}

/// Thread-safe session store with sliding TTL
pub struct SessionStore {
    ttl: Duration,
    sessions: DashMap<SessionToken, Session>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: DashMap::new(),
        }
    }

    /// Open a session for `user` with a fresh token.
    pub fn add_new_session(&self, user: UserId) -> SessionToken {
        let token = SessionToken::generate();
        self.sessions.insert(
            token.clone(),
            Session {
                user,
                expires_at: Instant::now() + self.ttl,
            },
        );
        debug!(user_id = %user, "session opened");
        token
    }

    /// Absent or past-expiry sessions are expired (and evicted); a live
    /// session has its expiry pushed out by one TTL.
    pub fn is_expired(&self, token: &SessionToken) -> bool {
        self.touch(token).is_none()
    }

    /// User bound to the token, without touching its expiry
    pub fn get_reference(&self, token: &SessionToken) -> Option<UserId> {
        self.sessions.get(token).map(|s| s.user)
    }

    /// Expiry check, refresh and lookup as one step.
    pub fn authenticate(&self, token: &SessionToken) -> Option<UserId> {
        self.touch(token)
    }

    fn touch(&self, token: &SessionToken) -> Option<UserId> {
        let now = Instant::now();
        match self.sessions.entry(token.clone()) {
            Entry::Vacant(_) => None,
            Entry::Occupied(mut entry) => {
                if entry.get().expires_at <= now {
                    entry.remove();
                    None
                } else {
                    let session = entry.get_mut();
                    session.expires_at = now + self.ttl;
                    Some(session.user)
                }
            }
        }
    }

    /// Evict every expired session; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Handle to the periodic expiry sweep
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!("Session sweeper task failed: {}", e);
        }
    }
}

/// Spawn a task that purges expired sessions every `interval`.
pub fn spawn_sweeper(store: Arc<SessionStore>, interval: Duration) -> SweeperHandle {
    let (shutdown, mut rx) = watch::channel(false);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        loop {
            tokio::select! {
                biased;
                changed = rx.changed() => {
                    if changed.is_err() || *rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let purged = store.purge_expired();
                    if purged > 0 {
                        debug!(purged, remaining = store.len(), "expired sessions purged");
                    }
                }
            }
        }
        info!("Session sweeper stopped");
    });
    SweeperHandle { shutdown, join }
}
