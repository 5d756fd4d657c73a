//! Per-conversation dialog state and stage derivation.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::intent::Intent;
use crate::llm::Message;

/// Author of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    /// The shopper.
    User,
    /// The chat assistant.
    Assistant,
}

/// One message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Who wrote it.
    pub role: HistoryRole,
    /// Message text.
    pub content: String,
    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn new(role: HistoryRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

impl From<&HistoryEntry> for Message {
    fn from(entry: &HistoryEntry) -> Self {
        match entry.role {
            HistoryRole::User => Message::user(entry.content.clone()),
            HistoryRole::Assistant => Message::assistant(entry.content.clone()),
        }
    }
}

/// Where a conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// First contact.
    Greeting,
    /// Shopper asked for checkout help.
    Checkout,
    /// Shopper is looking at products or prices.
    ProductDiscovery,
    /// Shopper raised an objection.
    ObjectionHandling,
    /// Long-running conversation.
    Engagement,
    /// Anything else.
    Information,
}

impl Stage {
    /// Wire label of this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Checkout => "checkout",
            Self::ProductDiscovery => "product_discovery",
            Self::ObjectionHandling => "objection_handling",
            Self::Engagement => "engagement",
            Self::Information => "information",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the stage from the message count and last intent.
///
/// Rules are evaluated in order and the first match wins. Stages carry no
/// ordering, so a later message may move the conversation "backwards".
pub fn derive_stage(message_count: u64, last_intent: Option<Intent>) -> Stage {
    if message_count <= 1 {
        return Stage::Greeting;
    }
    match last_intent {
        Some(Intent::CheckoutHelp) => Stage::Checkout,
        Some(Intent::ProductInquiry | Intent::PriceInquiry) => Stage::ProductDiscovery,
        Some(Intent::Objection) => Stage::ObjectionHandling,
        _ if message_count >= 5 => Stage::Engagement,
        _ => Stage::Information,
    }
}

/// Dialog state for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Ordered, append-only message history.
    pub conversation_history: Vec<HistoryEntry>,
    /// Shopper preferences gathered during the conversation.
    pub preferences: BTreeMap<String, serde_json::Value>,
    /// Most recent classified intent.
    pub last_intent: Option<Intent>,
    /// Most recent raw user message.
    pub last_message: Option<String>,
    /// Number of inbound user messages.
    pub message_count: u64,
    stage: Stage,
    /// When the state was created.
    pub created_at: DateTime<Utc>,
    /// When the state was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Create empty state for a new conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            conversation_history: Vec::new(),
            preferences: BTreeMap::new(),
            last_intent: None,
            last_message: None,
            message_count: 0,
            stage: derive_stage(0, None),
            created_at: now,
            updated_at: now,
        }
    }

    /// Current stage. Recomputed on every update, never set directly.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Apply an inbound user message that was classified as `intent`.
    pub fn record_user_message(&mut self, intent: Intent, message: &str) {
        self.last_intent = Some(intent);
        self.last_message = Some(message.to_string());
        self.message_count += 1;
        self.append_history(HistoryRole::User, message);
        self.stage = derive_stage(self.message_count, self.last_intent);
        self.touch();
    }

    /// Record the assistant's reply.
    pub fn record_assistant_message(&mut self, reply: &str) {
        self.append_history(HistoryRole::Assistant, reply);
        self.touch();
    }

    /// Append to history unless the same role and content already trail it.
    ///
    /// Returns whether an entry was appended.
    pub fn append_history(&mut self, role: HistoryRole, content: &str) -> bool {
        let duplicate = self
            .conversation_history
            .last()
            .is_some_and(|last| last.role == role && last.content == content);
        if duplicate {
            return false;
        }
        self.conversation_history.push(HistoryEntry::new(role, content));
        true
    }

    /// The last `n` history entries, oldest first.
    pub fn recent_history(&self, n: usize) -> &[HistoryEntry] {
        let start = self.conversation_history.len().saturating_sub(n);
        &self.conversation_history[start..]
    }

    /// Merge preference keys, replacing existing values.
    pub fn merge_preferences(
        &mut self,
        preferences: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) {
        self.preferences.extend(preferences);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
