use crate::media::TrackKind;
use focusmesh_core::{IceCandidate, PeerId};
use std::fmt;

/// Identifies one incarnation of a peer connection. A peer that is
/// re-offered gets a new generation, so late events from the old transport
/// can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub peer_id: PeerId,
    pub generation: u64,
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.peer_id, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub stream_id: String,
    pub track_id: String,
    pub kind: TrackKind,
}

/// Coarse connection state as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug)]
pub enum TransportEvent {
    CandidateGenerated(ConnectionKey, IceCandidate),
    TrackAttached(ConnectionKey, RemoteStream),
    StateChanged(ConnectionKey, LinkState),
}

impl TransportEvent {
    pub fn key(&self) -> &ConnectionKey {
        match self {
            TransportEvent::CandidateGenerated(key, _)
            | TransportEvent::TrackAttached(key, _)
            | TransportEvent::StateChanged(key, _) => key,
        }
    }
}
