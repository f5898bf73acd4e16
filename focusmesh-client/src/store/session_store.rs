use crate::media::LocalMedia;
use crate::transport::RemoteStream;
use focusmesh_core::{ChatEntry, FocusKind, FocusLogEntry, PeerId, RoomName, TimerState};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: PeerId,
    pub stream: RemoteStream,
}

/// Read-only copy of the store published to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub local_id: PeerId,
    pub room: Option<RoomName>,
    pub timer: TimerState,
    pub participants: Vec<Participant>,
    pub chat: Vec<ChatEntry>,
    pub focus_log: Vec<FocusLogEntry>,
    pub member_count: u32,
    pub has_local_media: bool,
    pub active: bool,
}

/// Local view of the shared session. Plain data; every field group has a
/// single writer (roster: coordinator, timer: timer sync, chat: chat relay).
#[derive(Debug)]
pub struct SessionStore {
    local_id: PeerId,
    room: Option<RoomName>,
    timer: TimerState,
    participants: Vec<Participant>,
    chat: Vec<ChatEntry>,
    focus_log: Vec<FocusLogEntry>,
    member_count: u32,
    local_media: Option<LocalMedia>,
    next_entry_id: u64,
    revision: u64,
}

impl SessionStore {
    pub fn new(local_id: PeerId, default_timer_secs: u32) -> Self {
        Self {
            local_id,
            room: None,
            timer: TimerState::idle(default_timer_secs),
            participants: Vec::new(),
            chat: Vec::new(),
            focus_log: Vec::new(),
            member_count: 1,
            local_media: None,
            next_entry_id: 1,
            revision: 0,
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn room(&self) -> Option<&RoomName> {
        self.room.as_ref()
    }

    /// Bumped by every change that shows up in a snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_room(&mut self, room: Option<RoomName>) {
        if self.room != room {
            self.room = room;
            self.touch();
        }
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn update_timer(&mut self, f: impl FnOnce(&mut TimerState)) {
        let before = self.timer;
        f(&mut self.timer);
        if self.timer != before {
            self.touch();
        }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &PeerId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    /// Rejects a second entry for the same id.
    pub fn add_participant(&mut self, participant: Participant) -> bool {
        if self.participant(&participant.id).is_some() {
            return false;
        }
        self.participants.push(participant);
        self.touch();
        true
    }

    /// Removes at most one entry.
    pub fn remove_participant(&mut self, id: &PeerId) -> bool {
        let Some(index) = self.participants.iter().position(|p| &p.id == id) else {
            return false;
        };
        self.participants.remove(index);
        self.touch();
        true
    }

    pub fn clear_participants(&mut self) {
        if !self.participants.is_empty() {
            self.participants.clear();
            self.touch();
        }
    }

    pub fn chat(&self) -> &[ChatEntry] {
        &self.chat
    }

    pub fn push_chat(&mut self, sender: impl Into<String>, text: impl Into<String>) -> &ChatEntry {
        let id = self.next_id();
        let index = self.chat.len();
        self.chat.push(ChatEntry {
            id,
            sender: sender.into(),
            text: text.into(),
            timestamp: now_millis(),
        });
        self.touch();
        &self.chat[index]
    }

    pub fn focus_log(&self) -> &[FocusLogEntry] {
        &self.focus_log
    }

    pub fn push_focus(&mut self, kind: FocusKind, duration: u32) {
        let id = self.next_id();
        self.focus_log.push(FocusLogEntry { id, kind, duration });
        self.touch();
    }

    pub fn member_count(&self) -> u32 {
        self.member_count
    }

    pub fn set_member_count(&mut self, count: u32) {
        if self.member_count != count {
            self.member_count = count;
            self.touch();
        }
    }

    pub fn local_media(&self) -> Option<&LocalMedia> {
        self.local_media.as_ref()
    }

    pub fn set_local_media(&mut self, media: Option<LocalMedia>) {
        self.local_media = media;
        self.touch();
    }

    pub fn take_local_media(&mut self) -> Option<LocalMedia> {
        let media = self.local_media.take();
        if media.is_some() {
            self.touch();
        }
        media
    }

    pub fn snapshot(&self, active: bool) -> SessionSnapshot {
        SessionSnapshot {
            local_id: self.local_id.clone(),
            room: self.room.clone(),
            timer: self.timer,
            participants: self.participants.clone(),
            chat: self.chat.clone(),
            focus_log: self.focus_log.clone(),
            member_count: self.member_count,
            has_local_media: self.local_media.is_some(),
            active,
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_entry_id;
        self.next_entry_id += 1;
        id
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
