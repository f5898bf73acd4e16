use crate::transport::TransportConfig;
use focusmesh_core::RoomName;
use focusmesh_core::utils::DEFAULT_TIMER_SECS;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do with remote ICE candidates that arrive before the remote
/// description has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidatePolicy {
    /// Queue them and replay once the description lands.
    #[default]
    Buffer,
    /// Drop them.
    Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the relay; the room path is appended as `/ws/<room>`.
    pub relay_url: String,
    pub transport: TransportConfig,
    pub candidate_policy: CandidatePolicy,
    /// Duration used by `reset` and by a `start` without a duration.
    pub default_timer_secs: u32,
    /// Sender label for locally authored chat entries.
    pub self_label: String,
    pub tick_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://localhost:8000".to_owned(),
            transport: TransportConfig::default(),
            candidate_policy: CandidatePolicy::default(),
            default_timer_secs: DEFAULT_TIMER_SECS,
            self_label: "Me".to_owned(),
            tick_interval_ms: 1000,
        }
    }
}

impl ClientConfig {
    pub fn room_url(&self, room: &RoomName) -> String {
        format!(
            "{}/ws/{}",
            self.relay_url.trim_end_matches('/'),
            utf8_percent_encode(room.as_str(), PATH_SEGMENT)
        )
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Everything outside the RFC 3986 unreserved set.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
