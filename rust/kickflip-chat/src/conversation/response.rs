//! What a turn returns to the chat widget.

use serde::{Deserialize, Serialize};

use super::recommender::ProductRecommendation;

/// Side effect the widget should perform alongside the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Render product cards.
    ProductRecommendations {
        /// Products to show, best match first.
        products: Vec<ProductRecommendation>,
    },
}

/// Reply text plus actions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Text shown to the shopper.
    pub response: String,
    /// Widget actions, possibly empty.
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl TurnResponse {
    /// Reply without actions.
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            actions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_shape() {
        let action = Action::ProductRecommendations {
            products: vec![ProductRecommendation {
                name: "Cruiser".to_string(),
                ..ProductRecommendation::default()
            }],
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "product_recommendations");
        assert_eq!(json["products"][0]["name"], "Cruiser");
    }

    #[test]
    fn test_text_reply_has_no_actions() {
        let reply = TurnResponse::text("hello");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["response"], "hello");
        assert_eq!(json["actions"], serde_json::json!([]));
    }
}
