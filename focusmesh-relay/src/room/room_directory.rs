use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use focusmesh_core::ChatEntry;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Messages kept per room.
pub const CHAT_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: u64,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("room name must not be empty")]
    EmptyName,

    #[error("room {0} already exists")]
    Exists(String),
}

/// Known rooms and their chat history. Outlives the live rooms, which are
/// dropped as soon as their last member leaves.
#[derive(Debug, Clone, Default)]
pub struct RoomDirectory {
    rooms: Arc<DashMap<String, RoomRecord>>,
    history: Arc<DashMap<String, VecDeque<ChatEntry>>>,
    next_room_id: Arc<AtomicU64>,
    next_message_id: Arc<AtomicU64>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, name: &str) -> Result<RoomRecord, DirectoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DirectoryError::EmptyName);
        }
        match self.rooms.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(DirectoryError::Exists(name.to_owned())),
            Entry::Vacant(slot) => {
                let record = self.record(name);
                info!("Registered room {} (#{})", record.name, record.id);
                Ok(slot.insert(record).clone())
            }
        }
    }

    /// The record for `name`, registering it on first use.
    pub fn ensure(&self, name: &str) -> RoomRecord {
        self.rooms
            .entry(name.to_owned())
            .or_insert_with(|| self.record(name))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<RoomRecord> {
        self.rooms.get(name).map(|r| r.clone())
    }

    /// All rooms in creation order.
    pub fn list(&self) -> Vec<RoomRecord> {
        let mut rooms: Vec<RoomRecord> = self.rooms.iter().map(|r| r.clone()).collect();
        rooms.sort_by_key(|r| r.id);
        rooms
    }

    pub fn record_chat(&self, room: &str, sender: &str, text: &str) -> ChatEntry {
        let entry = ChatEntry {
            id: self.next_message_id.fetch_add(1, Ordering::Relaxed) + 1,
            sender: sender.to_owned(),
            text: text.to_owned(),
            timestamp: now_millis(),
        };
        let mut history = self.history.entry(room.to_owned()).or_default();
        if history.len() == CHAT_HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(entry.clone());
        entry
    }

    /// Oldest first.
    pub fn history(&self, room: &str) -> Vec<ChatEntry> {
        self.history
            .get(room)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record(&self, name: &str) -> RoomRecord {
        RoomRecord {
            id: self.next_room_id.fetch_add(1, Ordering::Relaxed) + 1,
            name: name.to_owned(),
            created_at: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
