pub mod api;
mod config;
mod error;
pub mod room;
pub mod signaling;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use room::{RelayRoom, RoomDirectory, RoomManager, RoomMember, RoomRecord};
pub use signaling::ws_handler;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(manager: RoomManager) -> Router {
    Router::new()
        .route("/ws/{room}", get(ws_handler))
        .route("/rooms", get(api::list_rooms).post(api::create_room))
        .route("/chat/{room}", get(api::chat_history).post(api::post_chat))
        .with_state(manager)
}

pub async fn serve(config: RelayConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| RelayError::Bind {
            addr: config.bind,
            source,
        })?;
    serve_on(listener, RoomManager::new(config.default_timer_secs)).await
}

pub async fn serve_on(listener: TcpListener, manager: RoomManager) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Relay listening on {}", addr);
    }
    axum::serve(listener, router(manager))
        .await
        .map_err(RelayError::Serve)
}
