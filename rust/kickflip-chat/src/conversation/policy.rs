//! When to show product recommendations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::intent::Intent;
use super::state::ConversationState;

/// How early in a conversation products are offered.
///
/// Unrecognised configuration values fall back to [`OfferTiming::Conservative`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum OfferTiming {
    /// Offer from the second message.
    Early,
    /// Offer from the third message.
    Balanced,
    /// Offer from the fifth message.
    #[default]
    Conservative,
}

impl OfferTiming {
    /// Message count at which recommendations start.
    pub fn threshold(self) -> u64 {
        match self {
            Self::Early => 2,
            Self::Balanced => 3,
            Self::Conservative => 5,
        }
    }

    /// Wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Balanced => "balanced",
            Self::Conservative => "conservative",
        }
    }
}

impl From<&str> for OfferTiming {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "early" => Self::Early,
            "balanced" => Self::Balanced,
            _ => Self::Conservative,
        }
    }
}

impl From<String> for OfferTiming {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for OfferTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether this turn should carry product recommendations.
///
/// Product inquiries always do; otherwise the message count must have reached
/// the timing threshold.
pub fn should_recommend(intent: Intent, state: &ConversationState, timing: OfferTiming) -> bool {
    if intent == Intent::ProductInquiry {
        return true;
    }
    state.message_count >= timing.threshold()
}
