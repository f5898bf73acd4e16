use crate::api::ApiResult;
use crate::room::{RoomManager, RoomRecord};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: u64,
    pub name: String,
    pub created_at: u64,
    /// Sockets currently joined.
    pub members: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

/// GET /rooms
pub async fn list_rooms(State(manager): State<RoomManager>) -> Json<Vec<RoomSummary>> {
    let rooms = manager
        .directory()
        .list()
        .into_iter()
        .map(|RoomRecord { id, name, created_at }| RoomSummary {
            members: manager.member_count(&name),
            id,
            name,
            created_at,
        })
        .collect();
    Json(rooms)
}

/// POST /rooms
pub async fn create_room(
    State(manager): State<RoomManager>,
    Json(req): Json<CreateRoomRequest>,
) -> ApiResult<(StatusCode, Json<RoomRecord>)> {
    let record = manager.directory().create(&req.name)?;
    Ok((StatusCode::CREATED, Json(record)))
}
