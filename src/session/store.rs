//! In-memory session store

use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::Rng;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "treecast_session";

/// Generate a 256-bit session token, hex encoded
///
/// No uniqueness check is made; collisions are left to entropy.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = OsRng.gen();
    hex::encode(bytes)
}

/// Set of issued session tokens
///
/// With a TTL, tokens older than it are treated as absent and dropped on
/// first sight. Without one, a token stays valid until removed.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Instant>,
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
        }
    }

    /// Configured lifetime of a token, if any
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Record `token` as issued now; an existing entry is overwritten
    pub fn add(&self, token: impl Into<String>) {
        self.sessions.insert(token.into(), Instant::now());
    }

    /// Generate, record and return a fresh token
    pub fn issue(&self) -> String {
        let token = generate_token();
        self.add(token.clone());
        token
    }

    pub fn is_valid(&self, token: &str) -> bool {
        let Some(issued_at) = self.sessions.get(token).map(|entry| *entry.value()) else {
            return false;
        };

        if self.is_expired(issued_at, Instant::now()) {
            self.sessions.remove(token);
            tracing::debug!("Session expired");
            return false;
        }
        true
    }

    /// Forget `token`; removing an unknown token is fine
    pub fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Drop every expired token and return how many were removed
    pub fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, issued_at| !self.is_expired(*issued_at, now));
        before.saturating_sub(self.sessions.len())
    }

    /// Number of stored tokens, expired ones included until purged
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_expired(&self, issued_at: Instant, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(issued_at) >= ttl,
            None => false,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}
