//! Mock session store
//!
//! In-memory stand-in for a durable session table. Entries live for the
//! lifetime of the process only; nothing is written to disk. Expiry is
//! lazy: an entry whose `expires_at` has passed is evicted on read and
//! reported as absent. `purge_expired` offers an eager sweep for callers
//! that want one.

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use crate::types::SessionArtifact;

/// Process-wide in-memory session store
///
/// Safe for concurrent put/get from multiple in-flight runs.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionArtifact>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Store an artifact under its session id
    ///
    /// An existing entry with the same id is replaced.
    pub fn put(&self, artifact: SessionArtifact) {
        debug!(
            "Storing session {} (flow: {}, outcome: {:?})",
            artifact.id, artifact.flow, artifact.outcome
        );
        self.sessions.insert(artifact.id.clone(), artifact);
    }

    /// Retrieve an artifact by id
    ///
    /// Expired entries are evicted and reported as absent; repeated gets
    /// for an expired id all return `None`.
    pub fn get(&self, id: &str) -> Option<SessionArtifact> {
        let now = Utc::now();

        let expired = match self.sessions.get(id) {
            Some(entry) => entry.is_expired(now),
            None => return None,
        };

        if expired {
            debug!("Session {} expired, evicting", id);
            self.sessions.remove(id);
            return None;
        }

        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Delete an artifact by id, returning whether it was present
    pub fn delete(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Evict every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, artifact| !artifact.is_expired(now));
        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!("Purged {} expired sessions", removed);
        }
        removed
    }

    /// All live artifacts for a flow
    pub fn list_by_flow(&self, flow: &str) -> Vec<SessionArtifact> {
        let now = Utc::now();
        self.sessions
            .iter()
            .filter(|entry| entry.flow == flow && !entry.is_expired(now))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of stored entries, including not-yet-evicted expired ones
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
