//! Conversation state and intent dispatch.
//!
//! [`ConversationEngine`] is the entry point; the other modules are its steps
//! and can be used on their own.

pub mod classifier;
pub mod engine;
pub mod handlers;
pub mod intent;
pub mod outcome;
pub mod policy;
pub mod prompts;
pub mod recommender;
pub mod response;
pub mod state;
pub mod store;

pub use classifier::IntentClassifier;
pub use engine::ConversationEngine;
pub use handlers::{handler_for, HandlerContext, IntentHandler};
pub use intent::{Intent, IntentResult};
pub use outcome::Outcome;
pub use policy::{should_recommend, OfferTiming};
pub use recommender::{Price, ProductRecommendation, RecommendationGenerator};
pub use response::{Action, TurnResponse};
pub use state::{derive_stage, ConversationState, HistoryEntry, HistoryRole, Stage};
pub use store::{InMemoryStateStore, RedisStateStore, StateStore};
