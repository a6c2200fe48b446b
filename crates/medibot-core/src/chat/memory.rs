//! Session memory cache.
//!
//! Holds a role-tagged transcript per (user, session) so follow-up questions
//! can be contextualized without re-reading every turn from storage. Entries
//! are transient: they are rebuilt from persisted turns on first access after
//! a restart and are never evicted on their own.
//!
//! The storage backend is the `SessionMemoryStore` trait; the default
//! `InMemorySessionMemoryStore` is a `DashMap`. All reads return clones so no
//! map guard outlives the call.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use medibot_types::chat::{SessionKey, Transcript, Turn};

/// Key-value backend for cached transcripts.
pub trait SessionMemoryStore: Send + Sync {
    /// Cloned transcript for `key`, if present.
    fn get(&self, key: &SessionKey) -> Option<Transcript>;

    /// Insert or replace the transcript for `key`.
    fn put(&self, key: SessionKey, transcript: Transcript);

    /// Remove the entry for `key`, returning whether one existed.
    fn delete(&self, key: &SessionKey) -> bool;

    /// Keep only the entries for which `keep` returns true.
    fn retain(&self, keep: &dyn Fn(&SessionKey) -> bool);

    /// Number of cached transcripts.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local `SessionMemoryStore` backed by a concurrent map.
///
/// Cloning produces a shared view of the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionMemoryStore {
    inner: Arc<DashMap<SessionKey, Transcript>>,
}

impl InMemorySessionMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionMemoryStore for InMemorySessionMemoryStore {
    fn get(&self, key: &SessionKey) -> Option<Transcript> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn put(&self, key: SessionKey, transcript: Transcript) {
        self.inner.insert(key, transcript);
    }

    fn delete(&self, key: &SessionKey) -> bool {
        self.inner.remove(key).is_some()
    }

    fn retain(&self, keep: &dyn Fn(&SessionKey) -> bool) {
        self.inner.retain(|key, _| keep(key));
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Transcript cache keyed by (user, session).
///
/// Callers must serialize operations on the same key (see
/// [`SessionLocks`](super::lock::SessionLocks)); the cache itself only
/// guarantees that each individual call is atomic.
pub struct SessionMemoryCache<S: SessionMemoryStore> {
    store: S,
}

impl<S: SessionMemoryStore> SessionMemoryCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The cached transcript, without touching storage.
    pub fn get(&self, user_id: Uuid, session_id: Uuid) -> Option<Transcript> {
        self.store.get(&SessionKey::new(user_id, session_id))
    }

    /// Return the cached transcript, building it from `persisted_turns` when
    /// absent.
    pub fn get_or_build(&self, user_id: Uuid, session_id: Uuid, persisted_turns: &[Turn]) -> Transcript {
        let key = SessionKey::new(user_id, session_id);
        if let Some(existing) = self.store.get(&key) {
            return existing;
        }

        let transcript = Transcript::from_turns(persisted_turns);
        tracing::debug!(%key, messages = transcript.len(), "Built session memory from storage");
        self.store.put(key, transcript.clone());
        transcript
    }

    /// Append one exchange to a cached transcript.
    ///
    /// Does nothing when the entry is absent: the next `get_or_build` replays
    /// storage, which already holds the turn.
    pub fn append(&self, user_id: Uuid, session_id: Uuid, user_message: &str, response: &str) {
        let key = SessionKey::new(user_id, session_id);
        if let Some(mut transcript) = self.store.get(&key) {
            transcript.push_exchange(user_message, response);
            self.store.put(key, transcript);
        }
    }

    /// Replace the entry with a fresh replay of `persisted_turns`.
    pub fn rebuild(&self, user_id: Uuid, session_id: Uuid, persisted_turns: &[Turn]) -> Transcript {
        let transcript = Transcript::from_turns(persisted_turns);
        self.store
            .put(SessionKey::new(user_id, session_id), transcript.clone());
        transcript
    }

    /// Install an empty transcript (new session).
    pub fn reset(&self, user_id: Uuid, session_id: Uuid) {
        self.store
            .put(SessionKey::new(user_id, session_id), Transcript::new());
    }

    /// Drop the entry for one session.
    pub fn invalidate(&self, user_id: Uuid, session_id: Uuid) -> bool {
        self.store.delete(&SessionKey::new(user_id, session_id))
    }

    /// Drop every entry belonging to `user_id`.
    pub fn invalidate_user(&self, user_id: Uuid) {
        self.store.retain(&|key| key.user_id != user_id);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
