//! LLM-backed intent classification.

use std::sync::Arc;

use serde::Deserialize;

use super::intent::{Intent, IntentResult};
use super::outcome::Outcome;
use super::prompts;
use crate::llm::{extract_json, LlmDriver, LlmRequest, Message};

/// Low temperature keeps labels stable between identical messages.
const CLASSIFIER_TEMPERATURE: f32 = 0.1;

/// Classifies user messages into the closed [`Intent`] set.
#[derive(Clone)]
pub struct IntentClassifier {
    driver: Arc<dyn LlmDriver>,
}

impl std::fmt::Debug for IntentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentClassifier")
            .field("provider", &self.driver.provider())
            .finish()
    }
}

/// Shape the classifier prompt asks for.
#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    0.5
}

impl IntentClassifier {
    /// Create a classifier on top of a completion driver.
    pub fn new(driver: Arc<dyn LlmDriver>) -> Self {
        Self { driver }
    }

    /// Classify a message.
    ///
    /// Never fails: transport, service and parse errors degrade to
    /// [`IntentResult::fallback`].
    pub async fn classify(&self, message: &str) -> Outcome<IntentResult> {
        match self.try_classify(message).await {
            Ok(result) => {
                tracing::debug!(
                    intent = %result.intent,
                    confidence = result.confidence,
                    "Message classified"
                );
                Outcome::Fresh(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Intent classification failed, using fallback");
                Outcome::degraded(IntentResult::fallback(), e)
            }
        }
    }

    async fn try_classify(&self, message: &str) -> anyhow::Result<IntentResult> {
        let request = LlmRequest::json(vec![
            Message::system(prompts::INTENT_CLASSIFIER),
            Message::user(message),
        ])
        .with_temperature(CLASSIFIER_TEMPERATURE);

        let reply = self.driver.complete(request).await?;
        parse_classification(&reply)
    }
}

/// Parse a classifier reply into an [`IntentResult`].
fn parse_classification(reply: &str) -> anyhow::Result<IntentResult> {
    let raw: RawClassification = serde_json::from_value(extract_json(reply)?)?;

    let intent = raw.intent.parse::<Intent>().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Classifier returned label outside the intent set");
        Intent::GeneralQuestion
    });

    Ok(IntentResult::new(intent, raw.confidence))
}
