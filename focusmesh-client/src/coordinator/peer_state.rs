use crate::transport::{ConnectionKey, PeerTransport, RemoteStream};
use focusmesh_core::{IceCandidate, PeerId, SessionDescription};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Idle,
    Offering,
    Answering,
    Negotiating,
    Connected,
    Failed,
    Closed,
}

impl PeerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PeerState::Failed | PeerState::Closed)
    }
}

/// One pairwise connection as seen by the coordinator.
pub struct PeerConnection {
    pub(crate) key: ConnectionKey,
    pub(crate) state: PeerState,
    pub(crate) transport: Option<Arc<dyn PeerTransport>>,
    pub(crate) outbound_tracks: Vec<String>,
    pub(crate) inbound: Option<RemoteStream>,
    pub(crate) remote_applied: bool,
    pub(crate) local_sent: bool,
    pub(crate) ice_connected: bool,
    /// Remote candidates waiting for the remote description.
    pub(crate) pending_remote: Vec<IceCandidate>,
    /// Local candidates waiting for our offer or answer to go out.
    pub(crate) pending_local: Vec<IceCandidate>,
    /// The offer being answered, until the transport exists.
    pub(crate) pending_offer: Option<SessionDescription>,
}

impl PeerConnection {
    pub(crate) fn new(key: ConnectionKey, state: PeerState, outbound_tracks: Vec<String>) -> Self {
        Self {
            key,
            state,
            transport: None,
            outbound_tracks,
            inbound: None,
            remote_applied: false,
            local_sent: false,
            ice_connected: false,
            pending_remote: Vec::new(),
            pending_local: Vec::new(),
            pending_offer: None,
        }
    }

    pub fn key(&self) -> &ConnectionKey {
        &self.key
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.key.peer_id
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub fn transport(&self) -> Option<&Arc<dyn PeerTransport>> {
        self.transport.as_ref()
    }

    pub fn outbound_tracks(&self) -> &[String] {
        &self.outbound_tracks
    }

    pub fn inbound(&self) -> Option<&RemoteStream> {
        self.inbound.as_ref()
    }

    pub fn remote_applied(&self) -> bool {
        self.remote_applied
    }

    pub fn local_sent(&self) -> bool {
        self.local_sent
    }

    pub fn ice_connected(&self) -> bool {
        self.ice_connected
    }

    pub fn pending_remote(&self) -> &[IceCandidate] {
        &self.pending_remote
    }

    pub fn pending_local(&self) -> &[IceCandidate] {
        &self.pending_local
    }

    /// Negotiating with ICE up and a stream attached.
    pub(crate) fn ready_to_connect(&self) -> bool {
        self.state == PeerState::Negotiating && self.ice_connected && self.inbound.is_some()
    }
}

impl fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConnection")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("has_transport", &self.transport.is_some())
            .field("outbound_tracks", &self.outbound_tracks)
            .field("inbound", &self.inbound)
            .field("remote_applied", &self.remote_applied)
            .field("local_sent", &self.local_sent)
            .field("ice_connected", &self.ice_connected)
            .field("pending_remote", &self.pending_remote.len())
            .field("pending_local", &self.pending_local.len())
            .field("pending_offer", &self.pending_offer.is_some())
            .finish()
    }
}
