//! Conversation endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationState, TurnResponse};
use crate::error::ConversationResult;
use crate::AppState;

/// Create the conversations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/conversations", post(start_conversation))
        .route(
            "/api/v1/conversations/{conversation_id}",
            get(get_conversation).delete(end_conversation),
        )
        .route(
            "/api/v1/conversations/{conversation_id}/messages",
            post(send_message),
        )
        .route(
            "/api/v1/conversations/{conversation_id}/preferences",
            put(update_preferences),
        )
}

#[derive(Debug, Serialize)]
struct StartResponse {
    conversation_id: String,
}

async fn start_conversation(
    State(state): State<AppState>,
) -> ConversationResult<(StatusCode, Json<StartResponse>)> {
    let conversation_id = state.engine.start_conversation().await?;
    Ok((StatusCode::CREATED, Json(StartResponse { conversation_id })))
}

/// Inbound chat message.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// Shopper text.
    #[serde(default)]
    pub message: String,
}

async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> ConversationResult<Json<TurnResponse>> {
    let reply = state
        .engine
        .process_message(&conversation_id, &request.message)
        .await?;
    Ok(Json(reply))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> ConversationResult<Json<ConversationState>> {
    Ok(Json(state.engine.conversation_state(&conversation_id).await?))
}

async fn update_preferences(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(preferences): Json<serde_json::Map<String, serde_json::Value>>,
) -> ConversationResult<Json<ConversationState>> {
    let updated = state
        .engine
        .update_preferences(&conversation_id, preferences)
        .await?;
    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
struct EndResponse {
    ended: bool,
    conversation_id: String,
}

async fn end_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> ConversationResult<Json<EndResponse>> {
    let ended = state.engine.end_conversation(&conversation_id).await?;
    Ok(Json(EndResponse {
        ended,
        conversation_id,
    }))
}
