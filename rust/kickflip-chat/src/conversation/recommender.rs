//! Contextual product recommendations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::outcome::Outcome;
use super::prompts;
use super::state::{ConversationState, HistoryRole};
use crate::llm::{extract_json, LlmDriver, LlmRequest, Message};

/// Default number of history entries included in the prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// A product suggested to the shopper.
///
/// Every field is optional: the catalogue lives with the model provider's
/// context, not in this service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductRecommendation {
    /// Product identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Price as returned by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// Product page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Price either as a number or as preformatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    /// Numeric amount.
    Amount(f64),
    /// Text such as `"$49.99"`.
    Label(String),
}

#[derive(Debug, Deserialize)]
struct RecommendationReply {
    #[serde(default)]
    recommendations: Vec<ProductRecommendation>,
}

/// Requests ranked product suggestions from the completion service.
#[derive(Clone)]
pub struct RecommendationGenerator {
    driver: Arc<dyn LlmDriver>,
    history_window: usize,
}

impl std::fmt::Debug for RecommendationGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationGenerator")
            .field("provider", &self.driver.provider())
            .field("history_window", &self.history_window)
            .finish()
    }
}

impl RecommendationGenerator {
    /// Create a generator with the default history window.
    pub fn new(driver: Arc<dyn LlmDriver>) -> Self {
        Self {
            driver,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Override how many recent history entries go into the prompt.
    #[must_use]
    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    /// Recommend products for the current turn.
    ///
    /// Never fails: any error degrades to an empty list.
    pub async fn recommend(
        &self,
        message: &str,
        state: &ConversationState,
    ) -> Outcome<Vec<ProductRecommendation>> {
        match self.try_recommend(message, state).await {
            Ok(products) => {
                tracing::debug!(count = products.len(), "Recommendations generated");
                Outcome::Fresh(products)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation request failed, skipping this turn");
                Outcome::degraded(Vec::new(), e)
            }
        }
    }

    async fn try_recommend(
        &self,
        message: &str,
        state: &ConversationState,
    ) -> anyhow::Result<Vec<ProductRecommendation>> {
        let context = self.build_context(message, state)?;
        let request = LlmRequest::json(vec![
            Message::system(prompts::PRODUCT_RECOMMENDER),
            Message::user(context),
        ]);

        let reply = self.driver.complete(request).await?;
        let parsed: RecommendationReply = serde_json::from_value(extract_json(&reply)?)?;
        Ok(parsed.recommendations)
    }

    /// Build the contextual prompt from the message, preferences and the
    /// most recent slice of history.
    fn build_context(&self, message: &str, state: &ConversationState) -> anyhow::Result<String> {
        let preferences = serde_json::to_string(&state.preferences)?;
        let history = state
            .recent_history(self.history_window)
            .iter()
            .map(|entry| {
                let speaker = match entry.role {
                    HistoryRole::User => "Shopper",
                    HistoryRole::Assistant => "Assistant",
                };
                format!("{speaker}: {}", entry.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!(
            "Latest message: {message}\n\nPreferences: {preferences}\n\nRecent conversation:\n{history}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::intent::Intent;
    use crate::llm::{LlmSettings, Provider};
    use async_trait::async_trait;

    #[derive(Debug, Default)]
    struct NoopDriver {
        settings: LlmSettings,
    }

    #[async_trait]
    impl LlmDriver for NoopDriver {
        async fn complete(&self, _req: LlmRequest) -> anyhow::Result<String> {
            anyhow::bail!("offline")
        }

        fn provider(&self) -> Provider {
            Provider::Custom
        }

        fn settings(&self) -> &LlmSettings {
            &self.settings
        }
    }

    fn generator() -> RecommendationGenerator {
        RecommendationGenerator::new(Arc::new(NoopDriver::default()))
    }

    #[test]
    fn test_context_uses_last_five_entries() {
        let mut state = ConversationState::new();
        for i in 0..7 {
            state.record_user_message(Intent::GeneralQuestion, &format!("question {i}"));
        }
        let context = generator().build_context("anything else?", &state).unwrap();

        assert!(context.contains("Latest message: anything else?"));
        assert!(!context.contains("question 1"));
        assert!(context.contains("Shopper: question 2"));
        assert!(context.contains("Shopper: question 6"));
    }

    #[test]
    fn test_context_includes_preferences() {
        let mut state = ConversationState::new();
        state.merge_preferences([("deck_width".to_string(), serde_json::json!("8.25"))]);
        let context = generator().build_context("show me decks", &state).unwrap();
        assert!(context.contains(r#""deck_width":"8.25""#));
    }

    #[test]
    fn test_product_accepts_numeric_or_text_price() {
        let reply: RecommendationReply = serde_json::from_str(
            r#"{"recommendations": [
                {"id": "d-1", "name": "Street Deck", "description": "Maple", "price": 59.5},
                {"name": "Wheels", "description": "52mm", "price": "$34.00", "url": "https://shop.test/wheels"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(reply.recommendations.len(), 2);
        assert_eq!(reply.recommendations[0].price, Some(Price::Amount(59.5)));
        assert_eq!(
            reply.recommendations[1].price,
            Some(Price::Label("$34.00".to_string()))
        );
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty_list() {
        let outcome = generator().recommend("decks?", &ConversationState::new()).await;
        assert!(outcome.is_degraded());
        assert!(outcome.value().is_empty());
    }
}
