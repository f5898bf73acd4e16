use crate::room::{RelayRoom, RoomDirectory, RoomMember};
use axum::extract::ws::Message;
use dashmap::DashMap;
use focusmesh_core::{ChatEntry, PeerId, SignalMessage};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const ANONYMOUS: &str = "Anonymous";

#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<String, RelayRoom>>,
    directory: RoomDirectory,
    next_conn: Arc<AtomicU64>,
    default_timer_secs: u32,
}

impl RoomManager {
    pub fn new(default_timer_secs: u32) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            directory: RoomDirectory::new(),
            next_conn: Arc::new(AtomicU64::new(1)),
            default_timer_secs,
        }
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, |r| r.len())
    }

    /// Adds a member and returns its connection id. The joiner gets the
    /// room's timer first, then everyone gets the new count, then the
    /// others learn about the joiner.
    pub fn join(&self, room: &str, id: PeerId, tx: mpsc::UnboundedSender<Message>) -> u64 {
        let conn = self.next_conn.fetch_add(1, Ordering::Relaxed);
        self.directory.ensure(room);
        let mut entry = self.rooms.entry(room.to_owned()).or_insert_with(|| {
            info!("Creating new room: {}", room);
            RelayRoom::new(self.default_timer_secs)
        });

        entry.add_member(RoomMember {
            conn,
            id: id.clone(),
            tx,
        });
        info!("Peer {} joined room {} ({} members)", id, room, entry.len());

        let data = entry.timer_snapshot(Instant::now());
        entry.send_to_conn(conn, &SignalMessage::TimerSync { data });
        entry.broadcast(
            &SignalMessage::Members {
                count: entry.len() as u32,
            },
            None,
        );
        entry.broadcast(&SignalMessage::NewPeer { id }, Some(conn));
        conn
    }

    /// Records a message posted outside any socket and relays it to the
    /// room's live members, if there are any.
    pub fn post_chat(&self, room: &str, sender: Option<String>, text: &str) -> ChatEntry {
        let sender = sender
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_owned());
        self.directory.ensure(room);
        let entry = self.directory.record_chat(room, &sender, text);
        if let Some(live) = self.rooms.get(room) {
            live.broadcast(
                &SignalMessage::Chat {
                    text: entry.text.clone(),
                    sender: Some(entry.sender.clone()),
                    from: None,
                },
                None,
            );
        }
        entry
    }

    pub fn leave(&self, room: &str, conn: u64) {
        let Some(mut entry) = self.rooms.get_mut(room) else {
            return;
        };
        let Some(member) = entry.remove_member(conn) else {
            return;
        };
        info!("Peer {} left room {}", member.id, room);

        if entry.is_empty() {
            drop(entry);
            self.rooms.remove_if(room, |_, r| r.is_empty());
            info!("Room {} is empty, dropping it", room);
            return;
        }
        entry.broadcast(&SignalMessage::PeerLeft { id: member.id }, None);
        entry.broadcast(
            &SignalMessage::Members {
                count: entry.len() as u32,
            },
            None,
        );
    }

    /// Forwards one text frame from `conn`.
    pub fn route(&self, room: &str, conn: u64, text: &str) {
        let msg = match serde_json::from_str::<SignalMessage>(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Invalid message from connection {}: {}", conn, e);
                return;
            }
        };
        let Some(mut entry) = self.rooms.get_mut(room) else {
            return;
        };
        debug!("Routing {} in room {}", msg.type_name(), room);

        match msg {
            SignalMessage::Chat { text, sender, from } => {
                let sender = sender.unwrap_or_else(|| ANONYMOUS.to_owned());
                self.directory.record_chat(room, &sender, &text);
                let sender = Some(sender);
                entry.broadcast(&SignalMessage::Chat { text, sender, from }, None);
            }
            SignalMessage::Timer { action, data, .. } => {
                entry.apply_timer(action, &data, Instant::now());
                entry.broadcast_raw(text, None);
            }
            SignalMessage::Offer { .. }
            | SignalMessage::Answer { .. }
            | SignalMessage::Candidate { .. } => match msg.recipient() {
                Some(to) => entry.send_raw_to(to, text),
                None => entry.broadcast_raw(text, None),
            },
            _ => entry.broadcast_raw(text, None),
        }
    }
}
