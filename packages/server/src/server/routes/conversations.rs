//! Conversation-scoped endpoints used by the voice agent.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domains::incidents::{tool_definitions, ToolHandler, INVALID_LOCATION, LOCATION_UPDATED};
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    /// JSON object, or the JSON-encoded string the model produced
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub tool: String,
    pub output: String,
}

#[derive(Debug, Deserialize)]
pub struct PhotoEvent {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub analysis: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationUpdate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Tool definitions in function-calling format.
pub async fn tools_handler() -> Json<Vec<Value>> {
    Json(
        tool_definitions()
            .iter()
            .map(|definition| definition.to_openai_format())
            .collect(),
    )
}

/// Execute one tool call for a conversation.
///
/// Tool failures are reported in `output`, so this always answers 200.
pub async fn tool_call_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ToolCallRequest>,
) -> Json<ToolCallResponse> {
    let arguments = match request.arguments {
        Value::Null => String::new(),
        Value::String(raw) => raw,
        other => other.to_string(),
    };

    let conversation = state.conversations.get_or_create(&id).await;
    let output = conversation.handle_call(&request.name, &arguments).await;

    Json(ToolCallResponse {
        tool: request.name,
        output,
    })
}

/// Image event: the uploaded image's URL and its vision analysis.
pub async fn photo_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(event): Json<PhotoEvent>,
) -> Json<StatusResponse> {
    let conversation = state.conversations.get_or_create(&id).await;
    conversation.image_received(&event.url, &event.analysis).await;

    Json(StatusResponse {
        status: "stored".to_string(),
    })
}

/// GPS update pushed by the caller's device.
pub async fn location_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(update): Json<LocationUpdate>,
) -> (StatusCode, Json<StatusResponse>) {
    let conversation = state.conversations.get_or_create(&id).await;
    let stored = state
        .conversations
        .coordinator()
        .update_location(conversation.context(), update.lat, update.lng)
        .await;

    match stored {
        Some(_) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: LOCATION_UPDATED.to_string(),
            }),
        ),
        None => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(StatusResponse {
                status: INVALID_LOCATION.to_string(),
            }),
        ),
    }
}

/// End a conversation. Clients should call this when a call ends; conversations
/// left open are dropped by the idle sweep.
pub async fn end_conversation_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.conversations.remove(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
