//! Per-chat destination folder selection
//!
//! Each chat has at most one selected folder name. A text message
//! overwrites it, a file upload reads it. Nothing is persisted: a restart
//! forgets every selection.
//!
//! The store is an explicit handle passed to whoever needs it. Storage sits
//! behind [`SessionBackend`] so another backend can replace the in-memory
//! map without touching the handlers or the orchestrator.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

/// Opaque session identifier, one per chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(pub i64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage for folder selections.
///
/// Implementations must give last-write-wins semantics per key; keys are
/// independent of each other.
pub trait SessionBackend: Send + Sync {
    fn set(&self, key: SessionKey, folder: String);
    fn get(&self, key: SessionKey) -> Option<String>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock-sharded in-memory map. No eviction, no TTL.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    folders: DashMap<SessionKey, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemoryBackend {
    fn set(&self, key: SessionKey, folder: String) {
        self.folders.insert(key, folder);
    }

    fn get(&self, key: SessionKey) -> Option<String> {
        self.folders.get(&key).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.folders.len()
    }
}

/// Cloneable handle to the session state
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by [`MemoryBackend`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Selects `folder` for the session, replacing any earlier choice.
    ///
    /// The name is stored as given: empty names and names with quotes are
    /// accepted here and escaped by the storage client when queried.
    pub fn set_folder(&self, key: SessionKey, folder: impl Into<String>) {
        let folder = folder.into();
        log::debug!("Session {}: folder set to {:?}", key, folder);
        self.backend.set(key, folder);
    }

    /// The most recently selected folder, or `None` if the session never chose one.
    pub fn folder(&self, key: SessionKey) -> Option<String> {
        self.backend.get(key)
    }

    /// Number of sessions that have selected a folder
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore").field("sessions", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unset_session_has_no_folder() {
        let store = SessionStore::in_memory();
        assert_eq!(store.folder(SessionKey(1)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let store = SessionStore::in_memory();
        let key = SessionKey(42);

        store.set_folder(key, "Drafts");
        store.set_folder(key, "Archive");
        store.set_folder(key, "Reports");

        assert_eq!(store.folder(key).as_deref(), Some("Reports"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::in_memory();

        store.set_folder(SessionKey(1), "Alpha");
        store.set_folder(SessionKey(2), "Beta");

        assert_eq!(store.folder(SessionKey(1)).as_deref(), Some("Alpha"));
        assert_eq!(store.folder(SessionKey(2)).as_deref(), Some("Beta"));
    }

    #[test]
    fn test_any_text_is_accepted() {
        let store = SessionStore::in_memory();

        store.set_folder(SessionKey(7), "");
        assert_eq!(store.folder(SessionKey(7)).as_deref(), Some(""));

        store.set_folder(SessionKey(7), "it's \\ odd");
        assert_eq!(store.folder(SessionKey(7)).as_deref(), Some("it's \\ odd"));
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::in_memory();
        let handle = store.clone();

        handle.set_folder(SessionKey(5), "Shared");

        assert_eq!(store.folder(SessionKey(5)).as_deref(), Some("Shared"));
    }

    #[test]
    fn test_concurrent_writers_on_distinct_keys() {
        let store = SessionStore::in_memory();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for n in 0..100 {
                        store.set_folder(SessionKey(i), format!("folder-{}", n));
                    }
                })
            })
            .collect();
        for handle in handles {
            let _ = handle.join();
        }

        assert_eq!(store.len(), 8);
        for i in 0..8 {
            assert_eq!(store.folder(SessionKey(i)).as_deref(), Some("folder-99"));
        }
    }
}
