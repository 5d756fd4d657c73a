//! Conversation state storage.
//!
//! The engine only needs keyed get / put / remove. The in-memory store keeps
//! state for the process lifetime; the Redis store survives restarts and
//! expires idle conversations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::state::ConversationState;

/// Keyed storage for conversation state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load state for a conversation.
    async fn get(&self, conversation_id: &str) -> anyhow::Result<Option<ConversationState>>;

    /// Store state for a conversation, replacing what was there.
    async fn put(&self, conversation_id: &str, state: &ConversationState) -> anyhow::Result<()>;

    /// Drop state for a conversation. Returns whether state existed.
    async fn remove(&self, conversation_id: &str) -> anyhow::Result<bool>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Process-local state store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStore {
    states: Arc<RwLock<HashMap<String, ConversationState>>>,
}

impl InMemoryStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations.
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, conversation_id: &str) -> anyhow::Result<Option<ConversationState>> {
        Ok(self.states.read().get(conversation_id).cloned())
    }

    async fn put(&self, conversation_id: &str, state: &ConversationState) -> anyhow::Result<()> {
        self.states
            .write()
            .insert(conversation_id.to_string(), state.clone());
        Ok(())
    }

    async fn remove(&self, conversation_id: &str) -> anyhow::Result<bool> {
        Ok(self.states.write().remove(conversation_id).is_some())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Redis-backed state store.
///
/// State is stored as JSON under `conversation:{id}` and the TTL is refreshed
/// on every write.
#[derive(Clone)]
pub struct RedisStateStore {
    redis: redis::aio::ConnectionManager,
    ttl_secs: u64,
}

impl std::fmt::Debug for RedisStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStateStore")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl RedisStateStore {
    /// Connect to Redis.
    pub async fn connect(url: &str, ttl_secs: u64) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { redis, ttl_secs })
    }

    fn key(conversation_id: &str) -> String {
        format!("conversation:{conversation_id}")
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn get(&self, conversation_id: &str) -> anyhow::Result<Option<ConversationState>> {
        use redis::AsyncCommands;

        let mut redis = self.redis.clone();
        let value: Option<String> = redis.get(Self::key(conversation_id)).await?;
        match value {
            Some(v) => Ok(Some(serde_json::from_str(&v)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, conversation_id: &str, state: &ConversationState) -> anyhow::Result<()> {
        use redis::AsyncCommands;

        let mut redis = self.redis.clone();
        let value = serde_json::to_string(state)?;
        let _: () = redis
            .set_ex(Self::key(conversation_id), value, self.ttl_secs)
            .await?;
        Ok(())
    }

    async fn remove(&self, conversation_id: &str) -> anyhow::Result<bool> {
        use redis::AsyncCommands;

        let mut redis = self.redis.clone();
        let removed: i64 = redis.del(Self::key(conversation_id)).await?;
        Ok(removed > 0)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::intent::Intent;

    #[tokio::test]
    async fn test_in_memory_put_get_remove() {
        let store = InMemoryStateStore::new();
        assert!(store.get("c1").await.unwrap().is_none());

        let mut state = ConversationState::new();
        state.record_user_message(Intent::Greeting, "hello");
        store.put("c1", &state).await.unwrap();

        let loaded = store.get("c1").await.unwrap().unwrap();
        assert_eq!(loaded.message_count, 1);
        assert_eq!(store.len(), 1);

        assert!(store.remove("c1").await.unwrap());
        assert!(!store.remove("c1").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_clones_share_storage() {
        let store = InMemoryStateStore::new();
        let other = store.clone();
        store.put("c1", &ConversationState::new()).await.unwrap();
        assert!(other.get("c1").await.unwrap().is_some());
    }

    #[test]
    fn test_redis_key_format() {
        assert_eq!(RedisStateStore::key("abc"), "conversation:abc");
    }
}
