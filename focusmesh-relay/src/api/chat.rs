use crate::api::{ApiError, ApiResult};
use crate::room::RoomManager;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use focusmesh_core::ChatEntry;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PostChatRequest {
    pub text: String,
    #[serde(default)]
    pub sender: Option<String>,
}

/// GET /chat/{room}
pub async fn chat_history(
    State(manager): State<RoomManager>,
    Path(room): Path<String>,
) -> Json<Vec<ChatEntry>> {
    Json(manager.directory().history(&room))
}

/// POST /chat/{room}
pub async fn post_chat(
    State(manager): State<RoomManager>,
    Path(room): Path<String>,
    Json(req): Json<PostChatRequest>,
) -> ApiResult<(StatusCode, Json<ChatEntry>)> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("message text must not be empty"));
    }
    let entry = manager.post_chat(&room, req.sender, text);
    Ok((StatusCode::CREATED, Json(entry)))
}
