use crate::room::RoomManager;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use focusmesh_core::{PeerId, SignalMessage};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(manager): State<RoomManager>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, room, manager))
}

async fn handle_socket(socket: WebSocket, room: String, manager: RoomManager) {
    let (mut sender, mut receiver) = socket.split();

    let Some(peer_id) = wait_for_join(&mut receiver).await else {
        warn!("Closing socket in room {}: first message was not join", room);
        let _ = sender.send(Message::Close(None)).await;
        return;
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = manager.join(&room, peer_id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let manager = manager.clone();
        let room = room.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => manager.route(&room, conn, text.as_str()),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    manager.leave(&room, conn);
    info!("WebSocket disconnected: {} from room {}", peer_id, room);
}

/// Reads frames until the first data frame, which has to be `join`.
async fn wait_for_join(receiver: &mut SplitStream<WebSocket>) -> Option<PeerId> {
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                return match serde_json::from_str::<SignalMessage>(text.as_str()) {
                    Ok(SignalMessage::Join { id }) => Some(id),
                    Ok(other) => {
                        warn!("Expected join, got {}", other.type_name());
                        None
                    }
                    Err(e) => {
                        warn!("Invalid first message: {}", e);
                        None
                    }
                };
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            _ => return None,
        }
    }
    None
}
