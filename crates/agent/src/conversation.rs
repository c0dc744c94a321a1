//! Maps caller-facing conversation ids to upstream agent sessions.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use tracing::debug;

use crate::session::SessionIds;

/// In-memory conversation index. Upstream owns the history; this only
/// remembers which agent session a conversation id refers to.
///
/// Bounded: once full, inserting forgets the least recently used
/// conversation. Lookups count as use.
pub struct ConversationRegistry {
    entries: Mutex<LruCache<String, SessionIds>>,
}

impl ConversationRegistry {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn insert(&self, conversation_id: &str, ids: SessionIds) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((evicted, _)) = entries.push(conversation_id.to_string(), ids) {
            if evicted != conversation_id {
                debug!(conversation_id = %evicted, "conversation registry full, forgetting oldest");
            }
        }
    }

    pub fn get(&self, conversation_id: &str) -> Option<SessionIds> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(conversation_id).cloned()
    }

    pub fn remove(&self, conversation_id: &str) -> Option<SessionIds> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.pop(conversation_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cap()
            .get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u8) -> SessionIds {
        SessionIds {
            agent_id: format!("agent-{}", n),
            session_id: format!("session-{}", n),
        }
    }

    fn registry(capacity: usize) -> ConversationRegistry {
        ConversationRegistry::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_insert_get_remove() {
        let registry = registry(8);
        assert!(registry.is_empty());

        registry.insert("c1", ids(1));
        registry.insert("c2", ids(2));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("c1"), Some(ids(1)));

        registry.insert("c1", ids(3));
        assert_eq!(registry.get("c1"), Some(ids(3)));
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.remove("c2"), Some(ids(2)));
        assert_eq!(registry.get("c2"), None);
        assert_eq!(registry.remove("missing"), None);
    }

    #[test]
    fn test_full_registry_forgets_least_recently_used() {
        let registry = registry(2);
        registry.insert("c1", ids(1));
        registry.insert("c2", ids(2));

        // Touch c1 so c2 becomes the oldest.
        assert!(registry.get("c1").is_some());
        registry.insert("c3", ids(3));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.capacity(), 2);
        assert_eq!(registry.get("c2"), None);
        assert_eq!(registry.get("c1"), Some(ids(1)));
        assert_eq!(registry.get("c3"), Some(ids(3)));
    }

    #[test]
    fn test_one_shot_conversations_stay_bounded() {
        let registry = registry(10);
        for n in 0..50u8 {
            registry.insert(&format!("one-shot-{}", n), ids(n));
        }
        assert_eq!(registry.len(), 10);
        assert_eq!(registry.get("one-shot-0"), None);
        assert_eq!(registry.get("one-shot-49"), Some(ids(49)));
    }
}
