use axum::extract::ws::Message;
use focusmesh_core::{
    PeerId, SignalMessage, TimerAction, TimerActionKind, TimerPayload, TimerSnapshot, TimerState,
};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{error, warn};

/// One open socket in a room. `conn` tells apart sockets that announced
/// the same peer id.
#[derive(Debug, Clone)]
pub struct RoomMember {
    pub conn: u64,
    pub id: PeerId,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Members in join order plus the room's copy of the timer.
#[derive(Debug)]
pub struct RelayRoom {
    members: Vec<RoomMember>,
    timer: TimerState,
    timer_updated: Instant,
    default_timer_secs: u32,
}

impl RelayRoom {
    pub fn new(default_timer_secs: u32) -> Self {
        Self {
            members: Vec::new(),
            timer: TimerState::idle(default_timer_secs),
            timer_updated: Instant::now(),
            default_timer_secs,
        }
    }

    pub fn members(&self) -> &[RoomMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn add_member(&mut self, member: RoomMember) {
        self.members.push(member);
    }

    pub fn remove_member(&mut self, conn: u64) -> Option<RoomMember> {
        let index = self.members.iter().position(|m| m.conn == conn)?;
        Some(self.members.remove(index))
    }

    pub fn apply_timer(&mut self, kind: TimerActionKind, data: &TimerPayload, now: Instant) {
        let action = TimerAction::from_wire(kind, data, self.default_timer_secs);
        self.timer.apply(action, self.default_timer_secs);
        self.timer_updated = now;
    }

    /// The stored timer, counted down by the time since the last action.
    pub fn timer_snapshot(&self, now: Instant) -> TimerSnapshot {
        let elapsed = now.saturating_duration_since(self.timer_updated).as_secs();
        self.timer.advanced_by(elapsed).snapshot()
    }

    pub fn send_to_conn(&self, conn: u64, msg: &SignalMessage) {
        let Some(text) = encode(msg) else { return };
        if let Some(member) = self.members.iter().find(|m| m.conn == conn) {
            deliver(member, text);
        }
    }

    /// Delivers to the first member with `id`.
    pub fn send_raw_to(&self, id: &PeerId, text: &str) {
        match self.members.iter().find(|m| &m.id == id) {
            Some(member) => deliver(member, text.to_owned()),
            None => warn!("Attempted to forward to unknown peer {}", id),
        }
    }

    pub fn broadcast(&self, msg: &SignalMessage, except: Option<u64>) {
        if let Some(text) = encode(msg) {
            self.broadcast_raw(&text, except);
        }
    }

    pub fn broadcast_raw(&self, text: &str, except: Option<u64>) {
        for member in self.members.iter().filter(|m| Some(m.conn) != except) {
            deliver(member, text.to_owned());
        }
    }
}

fn encode(msg: &SignalMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to serialize {}: {}", msg.type_name(), e);
            None
        }
    }
}

fn deliver(member: &RoomMember, text: String) {
    if let Err(e) = member.tx.send(Message::Text(text.into())) {
        warn!("Failed to queue message for {}: {}", member.id, e);
    }
}
