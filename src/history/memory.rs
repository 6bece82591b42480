use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

use super::{Session, SessionHandle, SessionStore};
use crate::core::config::settings::SessionSection;

struct Entry {
    handle: SessionHandle,
    last_access: Instant,
}

impl Entry {
    /// A handle cloned out of the store is still held by a request.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.handle) > 1
    }
}

/// Process-local session store bounded by count (LRU) and idle time (TTL).
/// Nothing is persisted.
///
/// Sessions whose handle is held by a request are never evicted or expired;
/// while every resident session is busy the store grows past `max_sessions`.
pub struct InMemorySessionStore {
    sessions: Mutex<LruCache<String, Entry>>,
    max_sessions: usize,
    ttl: Option<Duration>,
}

impl InMemorySessionStore {
    pub fn new(max_sessions: usize, ttl: Option<Duration>) -> Self {
        Self {
            sessions: Mutex::new(LruCache::unbounded()),
            max_sessions: max_sessions.max(1),
            ttl,
        }
    }

    pub fn from_config(config: &SessionSection) -> Self {
        let ttl = (config.ttl_secs > 0).then(|| Duration::from_secs(config.ttl_secs));
        Self::new(config.max_sessions, ttl)
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Entry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        !entry.in_use()
            && self
                .ttl
                .map(|ttl| now.duration_since(entry.last_access) > ttl)
                .unwrap_or(false)
    }

    /// Drops idle sessions, least recently used first, until there is room
    /// for one more.
    fn make_room(&self, sessions: &mut LruCache<String, Entry>) {
        while sessions.len() >= self.max_sessions {
            let victim = sessions
                .iter()
                .rev()
                .find(|(_, entry)| !entry.in_use())
                .map(|(id, _)| id.clone());
            let Some(victim) = victim else {
                tracing::warn!(
                    resident = sessions.len(),
                    max_sessions = self.max_sessions,
                    "all sessions busy; exceeding session limit"
                );
                return;
            };
            sessions.pop(&victim);
            tracing::info!(session_id = %victim, "evicted least recently used session");
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, session_id: &str) -> SessionHandle {
        let now = Instant::now();
        let mut sessions = self.lock();

        if let Some(entry) = sessions.get_mut(session_id) {
            if !self.is_expired(entry, now) {
                entry.last_access = now;
                return entry.handle.clone();
            }
        }
        if sessions.pop(session_id).is_some() {
            tracing::debug!(session_id, "session expired; starting fresh");
        }

        self.make_room(&mut sessions);

        let handle: SessionHandle = Arc::new(tokio::sync::Mutex::new(Session::new(session_id)));
        let entry = Entry {
            handle: handle.clone(),
            last_access: now,
        };
        sessions.put(session_id.to_string(), entry);
        handle
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let now = Instant::now();
        let mut sessions = self.lock();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            sessions.pop(id);
        }
        expired.len()
    }
}
