//! Conversation orchestrator.
//!
//! One turn runs these steps in order:
//! 1. Load (or lazily create) the conversation state
//! 2. Classify the message intent
//! 3. Record the message, bump the count and recompute the stage
//! 4. Dispatch to the intent handler for the reply
//! 5. Ask the recommendation policy, and if it agrees, attach product cards
//!
//! Completion-service failures degrade inside steps 2 and 5. Anything else
//! that fails turns into an apology reply; only input validation errors reach
//! the caller.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::classifier::IntentClassifier;
use super::handlers::{handler_for, HandlerContext};
use super::policy::should_recommend;
use super::prompts;
use super::recommender::RecommendationGenerator;
use super::response::{Action, TurnResponse};
use super::state::ConversationState;
use super::store::StateStore;
use crate::config::ConversationConfig;
use crate::error::{ConversationError, ConversationResult};
use crate::llm::LlmDriver;
use crate::logging::OpTimer;

type TurnLock = Arc<tokio::sync::Mutex<()>>;
type TurnLocks = Mutex<HashMap<String, TurnLock>>;

/// A claim on one conversation's turn lock.
///
/// Dropping the slot removes the map entry once nobody else holds a claim,
/// including when the owning future is cancelled mid-turn.
struct TurnSlot<'a> {
    locks: &'a TurnLocks,
    conversation_id: String,
    lock: TurnLock,
}

impl<'a> TurnSlot<'a> {
    fn claim(locks: &'a TurnLocks, conversation_id: &str) -> Self {
        let lock = Arc::clone(locks.lock().entry(conversation_id.to_string()).or_default());
        Self {
            locks,
            conversation_id: conversation_id.to_string(),
            lock,
        }
    }

    async fn acquire(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for TurnSlot<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        let ours = locks
            .get(&self.conversation_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock));
        // One reference in the map, one held by this slot.
        if ours && Arc::strong_count(&self.lock) <= 2 {
            locks.remove(&self.conversation_id);
        }
    }
}

/// Runs conversation turns against an injected completion service and store.
pub struct ConversationEngine {
    driver: Arc<dyn LlmDriver>,
    store: Arc<dyn StateStore>,
    classifier: IntentClassifier,
    recommender: RecommendationGenerator,
    config: ConversationConfig,
    /// Serializes turns per conversation.
    turn_locks: TurnLocks,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("provider", &self.driver.provider())
            .field("store", &self.store.backend())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    /// Create an engine.
    pub fn new(
        driver: Arc<dyn LlmDriver>,
        store: Arc<dyn StateStore>,
        config: ConversationConfig,
    ) -> Self {
        let classifier = IntentClassifier::new(Arc::clone(&driver));
        let recommender = RecommendationGenerator::new(Arc::clone(&driver))
            .with_history_window(config.history_window);

        Self {
            driver,
            store,
            classifier,
            recommender,
            config,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Backend name of the state store.
    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Round-trip the state store once.
    pub async fn check_store(&self) -> ConversationResult<()> {
        self.store
            .get("readiness-probe")
            .await
            .map(|_| ())
            .map_err(ConversationError::Store)
    }

    /// Allocate a fresh conversation with empty state.
    pub async fn start_conversation(&self) -> ConversationResult<String> {
        let conversation_id = Uuid::new_v4().to_string();
        self.store
            .put(&conversation_id, &ConversationState::new())
            .await
            .map_err(ConversationError::Store)?;

        tracing::info!(conversation_id = %conversation_id, "Conversation started");
        Ok(conversation_id)
    }

    /// Run one turn for an inbound user message.
    pub async fn process_message(
        &self,
        conversation_id: &str,
        message: &str,
    ) -> ConversationResult<TurnResponse> {
        if message.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let slot = TurnSlot::claim(&self.turn_locks, conversation_id);
        let result = {
            let _guard = slot.acquire().await;
            let timer = OpTimer::new("conversation", "turn");
            let result = self.run_turn(conversation_id, message).await;
            timer.finish_with_result(result.as_ref());
            result
        };
        drop(slot);

        match result {
            Ok(reply) => Ok(reply),
            Err(e) => {
                tracing::error!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "Turn failed, replying with apology"
                );
                Ok(TurnResponse::text(prompts::APOLOGY))
            }
        }
    }

    /// End a conversation and release its state.
    ///
    /// Waits for an in-flight turn to finish first. Returns whether the
    /// conversation existed.
    pub async fn end_conversation(&self, conversation_id: &str) -> ConversationResult<bool> {
        let slot = TurnSlot::claim(&self.turn_locks, conversation_id);
        let removed = {
            let _guard = slot.acquire().await;
            self.store
                .remove(conversation_id)
                .await
                .map_err(ConversationError::Store)?
        };
        drop(slot);

        tracing::info!(conversation_id = %conversation_id, existed = removed, "Conversation ended");
        Ok(removed)
    }

    /// Snapshot of a conversation's state.
    pub async fn conversation_state(
        &self,
        conversation_id: &str,
    ) -> ConversationResult<ConversationState> {
        self.store
            .get(conversation_id)
            .await
            .map_err(ConversationError::Store)?
            .ok_or_else(|| ConversationError::NotFound(conversation_id.to_string()))
    }

    /// Merge shopper preferences into the conversation state.
    pub async fn update_preferences(
        &self,
        conversation_id: &str,
        preferences: serde_json::Map<String, serde_json::Value>,
    ) -> ConversationResult<ConversationState> {
        let slot = TurnSlot::claim(&self.turn_locks, conversation_id);
        let _guard = slot.acquire().await;
        self.merge_preferences(conversation_id, preferences)
            .await
            .map_err(ConversationError::Store)
    }

    async fn merge_preferences(
        &self,
        conversation_id: &str,
        preferences: serde_json::Map<String, serde_json::Value>,
    ) -> anyhow::Result<ConversationState> {
        let mut state = self.store.get(conversation_id).await?.unwrap_or_default();
        state.merge_preferences(preferences);
        self.store.put(conversation_id, &state).await?;
        Ok(state)
    }

    async fn run_turn(&self, conversation_id: &str, message: &str) -> anyhow::Result<TurnResponse> {
        let mut state = self.store.get(conversation_id).await?.unwrap_or_default();

        let classification = self.classifier.classify(message).await;
        if let Some(reason) = classification.reason() {
            tracing::warn!(
                conversation_id = %conversation_id,
                reason = %reason,
                "Classification degraded"
            );
        }
        let intent = classification.value().intent;

        state.record_user_message(intent, message);
        self.store.put(conversation_id, &state).await?;

        tracing::info!(
            conversation_id = %conversation_id,
            intent = %intent,
            stage = %state.stage(),
            message_count = state.message_count,
            "Message recorded"
        );

        let mut reply = handler_for(intent)
            .handle(HandlerContext {
                message,
                state: &state,
                driver: self.driver.as_ref(),
                store_name: &self.config.store_name,
                history_window: self.config.history_window,
            })
            .await?;

        state.record_assistant_message(&reply.response);
        self.store.put(conversation_id, &state).await?;

        if should_recommend(intent, &state, self.config.offer_timing) {
            let products = self.recommender.recommend(message, &state).await.into_value();
            if !products.is_empty() {
                tracing::info!(
                    conversation_id = %conversation_id,
                    count = products.len(),
                    "Attaching product recommendations"
                );
                reply.actions.push(Action::ProductRecommendations { products });
            }
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::store::InMemoryStateStore;
    use crate::llm::{LlmRequest, LlmSettings, Provider};
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct OfflineDriver {
        settings: LlmSettings,
    }

    #[async_trait]
    impl LlmDriver for OfflineDriver {
        async fn complete(&self, _req: LlmRequest) -> anyhow::Result<String> {
            anyhow::bail!("connection refused")
        }

        fn provider(&self) -> Provider {
            Provider::Custom
        }

        fn settings(&self) -> &LlmSettings {
            &self.settings
        }
    }

    /// Fails every completion after a fixed delay.
    #[derive(Debug, Default)]
    struct SlowDriver {
        settings: LlmSettings,
    }

    #[async_trait]
    impl LlmDriver for SlowDriver {
        async fn complete(&self, _req: LlmRequest) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            anyhow::bail!("operation timed out")
        }

        fn provider(&self) -> Provider {
            Provider::Custom
        }

        fn settings(&self) -> &LlmSettings {
            &self.settings
        }
    }

    fn engine_with(driver: Arc<dyn LlmDriver>) -> ConversationEngine {
        ConversationEngine::new(
            driver,
            Arc::new(InMemoryStateStore::new()),
            ConversationConfig::default(),
        )
    }

    fn engine() -> ConversationEngine {
        engine_with(Arc::new(OfflineDriver::default()))
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let engine = engine();
        let err = engine.process_message("c1", "   ").await.unwrap_err();
        assert!(matches!(err, ConversationError::EmptyMessage));
        assert!(matches!(
            engine.conversation_state("c1").await.unwrap_err(),
            ConversationError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_start_conversation_creates_empty_state() {
        let engine = engine();
        let id = engine.start_conversation().await.unwrap();
        let state = engine.conversation_state(&id).await.unwrap();
        assert_eq!(state.message_count, 0);
        assert!(state.conversation_history.is_empty());
    }

    #[tokio::test]
    async fn test_end_conversation_releases_state() {
        let engine = engine();
        let id = engine.start_conversation().await.unwrap();
        assert!(engine.end_conversation(&id).await.unwrap());
        assert!(!engine.end_conversation(&id).await.unwrap());
        assert!(engine.conversation_state(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_turn_locks_are_released() {
        let engine = engine();
        engine.process_message("c1", "hello").await.unwrap();
        assert!(engine.turn_locks.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_turns_release_their_locks() {
        let engine = engine_with(Arc::new(SlowDriver::default()));
        for i in 0..3 {
            let id = format!("abandoned-{i}");
            let turn = engine.process_message(&id, "hello");
            assert!(tokio::time::timeout(Duration::from_millis(50), turn).await.is_err());
        }
        assert!(engine.turn_locks.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_keeps_the_holder_lock() {
        let engine = engine_with(Arc::new(SlowDriver::default()));
        let holder = TurnSlot::claim(&engine.turn_locks, "c1");
        let guard = holder.acquire().await;

        let waiter = engine.process_message("c1", "hello");
        assert!(tokio::time::timeout(Duration::from_millis(20), waiter).await.is_err());
        assert_eq!(engine.turn_locks.lock().len(), 1);

        drop(guard);
        drop(holder);
        assert!(engine.turn_locks.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stale_slot_does_not_evict_a_newer_lock() {
        let engine = engine();
        let stale = TurnSlot::claim(&engine.turn_locks, "c1");
        engine.turn_locks.lock().remove("c1");
        let current = TurnSlot::claim(&engine.turn_locks, "c1");
        let other = TurnSlot::claim(&engine.turn_locks, "c1");

        drop(stale);
        assert!(engine.turn_locks.lock().contains_key("c1"));
        drop(other);
        drop(current);
        assert!(engine.turn_locks.lock().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_end_conversation_waits_for_in_flight_turn() {
        let engine = Arc::new(engine_with(Arc::new(SlowDriver::default())));
        let id = engine.start_conversation().await.unwrap();

        let turn = {
            let engine = Arc::clone(&engine);
            let id = id.clone();
            tokio::spawn(async move { engine.process_message(&id, "hello").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(engine.end_conversation(&id).await.unwrap());
        turn.await.unwrap().unwrap();

        assert!(matches!(
            engine.conversation_state(&id).await.unwrap_err(),
            ConversationError::NotFound(_)
        ));
        assert!(engine.turn_locks.lock().is_empty());
    }

    #[tokio::test]
    async fn test_update_preferences_creates_state_lazily() {
        let engine = engine();
        let mut prefs = serde_json::Map::new();
        prefs.insert("style".to_string(), serde_json::json!("street"));

        let state = engine.update_preferences("c9", prefs).await.unwrap();
        assert_eq!(state.preferences["style"], "street");
        assert_eq!(
            engine.conversation_state("c9").await.unwrap().preferences["style"],
            "street"
        );
    }
}
