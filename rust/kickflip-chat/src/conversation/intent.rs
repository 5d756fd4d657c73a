//! Intent categories and classification results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of message intents recognised by the chat flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Hello, hi, good morning.
    Greeting,
    /// Questions about products, features, availability.
    ProductInquiry,
    /// Questions about cost, discounts, pricing.
    PriceInquiry,
    /// Delivery times, shipping costs, tracking.
    ShippingInquiry,
    /// Returns, refunds, exchanges.
    ReturnPolicy,
    /// Help completing a purchase.
    CheckoutHelp,
    /// Hesitation or concerns about buying.
    Objection,
    /// Problems or dissatisfaction.
    Complaint,
    /// Anything else.
    GeneralQuestion,
}

impl Intent {
    /// Every intent, in prompt order.
    pub const ALL: [Intent; 9] = [
        Intent::Greeting,
        Intent::ProductInquiry,
        Intent::PriceInquiry,
        Intent::ShippingInquiry,
        Intent::ReturnPolicy,
        Intent::CheckoutHelp,
        Intent::Objection,
        Intent::Complaint,
        Intent::GeneralQuestion,
    ];

    /// Wire label of this intent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::ProductInquiry => "product_inquiry",
            Self::PriceInquiry => "price_inquiry",
            Self::ShippingInquiry => "shipping_inquiry",
            Self::ReturnPolicy => "return_policy",
            Self::CheckoutHelp => "checkout_help",
            Self::Objection => "objection",
            Self::Complaint => "complaint",
            Self::GeneralQuestion => "general_question",
        }
    }

    /// Parse a label, folding anything outside the closed set into
    /// [`Intent::GeneralQuestion`].
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Self::GeneralQuestion)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for labels outside the closed intent set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent label: {0}")]
pub struct UnknownIntent(pub String);

impl FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == normalized)
            .ok_or(UnknownIntent(normalized))
    }
}

/// Result of classifying one user message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Classified intent.
    pub intent: Intent,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

impl IntentResult {
    /// Build a result, clamping confidence into `[0, 1]`.
    pub fn new(intent: Intent, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self { intent, confidence }
    }

    /// Result used when classification could not be performed.
    pub fn fallback() -> Self {
        Self::new(Intent::GeneralQuestion, 0.5)
    }
}
