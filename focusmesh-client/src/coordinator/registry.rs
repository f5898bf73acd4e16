use crate::coordinator::{PeerConnection, PeerState};
use crate::transport::ConnectionKey;
use focusmesh_core::PeerId;
use std::collections::HashMap;

/// Active connections, at most one per remote peer.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<PeerId, PeerConnection>,
    next_generation: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a fresh connection for `peer_id` and returns its key together
    /// with the connection it replaced, if any.
    pub fn open(
        &mut self,
        peer_id: PeerId,
        state: PeerState,
        outbound_tracks: Vec<String>,
    ) -> (ConnectionKey, Option<PeerConnection>) {
        self.next_generation += 1;
        let key = ConnectionKey {
            peer_id: peer_id.clone(),
            generation: self.next_generation,
        };
        let conn = PeerConnection::new(key.clone(), state, outbound_tracks);
        let replaced = self.connections.insert(peer_id, conn);
        (key, replaced)
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<&PeerConnection> {
        self.connections.get(peer_id)
    }

    pub fn get_mut(&mut self, peer_id: &PeerId) -> Option<&mut PeerConnection> {
        self.connections.get_mut(peer_id)
    }

    /// The connection `key` names, unless it has since been replaced.
    pub fn current_mut(&mut self, key: &ConnectionKey) -> Option<&mut PeerConnection> {
        self.connections
            .get_mut(&key.peer_id)
            .filter(|conn| conn.key.generation == key.generation)
    }

    pub fn is_current(&self, key: &ConnectionKey) -> bool {
        self.connections
            .get(&key.peer_id)
            .is_some_and(|conn| conn.key.generation == key.generation)
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> Option<PeerConnection> {
        self.connections.remove(peer_id)
    }

    pub fn remove_current(&mut self, key: &ConnectionKey) -> Option<PeerConnection> {
        if !self.is_current(key) {
            return None;
        }
        self.connections.remove(&key.peer_id)
    }

    pub fn drain(&mut self) -> Vec<PeerConnection> {
        self.connections.drain().map(|(_, conn)| conn).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn count_in(&self, state: PeerState) -> usize {
        self.connections
            .values()
            .filter(|conn| conn.state == state)
            .count()
    }

    pub fn peer_ids(&self) -> impl Iterator<Item = &PeerId> {
        self.connections.keys()
    }
}
