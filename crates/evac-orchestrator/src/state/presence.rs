use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        SubscriberId(Uuid::new_v4())
    }
}

#[derive(Debug, Clone)]
pub struct FloorHandle {
    pub floor_id: String,
    pub floor_name: String,
}

/// Process-wide mapping from an opaque subscriber handle to the floor room
/// it joined. Writes are owned by the dispatch layer (subscribe/
/// unsubscribe on connect/disconnect); the per-floor cycle only ever reads
/// a snapshot once per floor at dispatch time.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    subscribers: RwLock<HashMap<SubscriberId, FloorHandle>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        PresenceRegistry {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn join(&self, subscriber: SubscriberId, floor_id: String, floor_name: String) {
        self.subscribers.write().await.insert(subscriber, FloorHandle { floor_id, floor_name });
    }

    pub async fn leave(&self, subscriber: SubscriberId) {
        self.subscribers.write().await.remove(&subscriber);
    }

    pub async fn size(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Deduplicated snapshot of floor ids with at least one subscriber.
    pub async fn floor_ids(&self) -> HashSet<String> {
        self.subscribers.read().await.values().map(|h| h.floor_id.clone()).collect()
    }

    pub async fn has_subscribers(&self, floor_id: &str) -> bool {
        self.subscribers.read().await.values().any(|h| h.floor_id == floor_id)
    }
}
