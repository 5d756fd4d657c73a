//! Conversation errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors surfaced to callers of the conversation engine.
///
/// Completion-service failures never show up here; they degrade inside the
/// turn instead.
#[derive(Error, Debug)]
pub enum ConversationError {
    /// The message was empty or whitespace only.
    #[error("Message must not be empty")]
    EmptyMessage,

    /// No state exists for the conversation.
    #[error("Conversation {0} not found")]
    NotFound(String),

    /// The state store could not be reached.
    #[error("State store error: {0}")]
    Store(#[source] anyhow::Error),
}

/// Result type alias for engine operations
pub type ConversationResult<T> = Result<T, ConversationError>;

impl ConversationError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "invalid_message",
            Self::NotFound(_) => "not_found",
            Self::Store(_) => "store_unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::EmptyMessage => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ConversationError {
    fn into_response(self) -> Response {
        if let Self::Store(ref e) = self {
            tracing::error!(error = %e, "State store error");
        }
        let body = Json(serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
