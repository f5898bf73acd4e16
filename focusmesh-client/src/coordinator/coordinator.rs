use crate::config::CandidatePolicy;
use crate::coordinator::negotiation::{self, NegotiationOutcome, NegotiationStep};
use crate::coordinator::{ConnectionRegistry, PeerConnection, PeerState};
use crate::signaling::SignalingOutput;
use crate::store::{Participant, SessionStore};
use crate::transport::{ConnectionKey, LinkState, PeerTransport, TransportEvent, TransportFactory};
use focusmesh_core::{IceCandidate, PeerId, SessionDescription, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Signaling input for the per-peer state machine, already filtered by
/// addressing and echo rules.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    NewPeer {
        id: PeerId,
    },
    OfferReceived {
        from: PeerId,
        offer: SessionDescription,
    },
    AnswerReceived {
        from: PeerId,
        answer: SessionDescription,
    },
    CandidateReceived {
        from: PeerId,
        candidate: IceCandidate,
    },
    PeerLeft {
        id: PeerId,
    },
}

/// Drives every pairwise connection through offer/answer/ICE and keeps the
/// roster in step with the connections that reached `Connected`.
///
/// Transport primitives run in `tasks`. Their outcomes come back through
/// [`Coordinator::next_outcome`] and are applied by
/// [`Coordinator::handle_outcome`], so no registry borrow lives across an
/// await.
pub struct Coordinator {
    local_id: PeerId,
    factory: Arc<dyn TransportFactory>,
    transport_tx: mpsc::Sender<TransportEvent>,
    signaling: Arc<dyn SignalingOutput>,
    policy: CandidatePolicy,
    registry: ConnectionRegistry,
    tasks: JoinSet<NegotiationOutcome>,
}

impl Coordinator {
    pub fn new(
        local_id: PeerId,
        factory: Arc<dyn TransportFactory>,
        transport_tx: mpsc::Sender<TransportEvent>,
        signaling: Arc<dyn SignalingOutput>,
        policy: CandidatePolicy,
    ) -> Self {
        Self {
            local_id,
            factory,
            transport_tx,
            signaling,
            policy,
            registry: ConnectionRegistry::new(),
            tasks: JoinSet::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Next finished negotiation step. `None` when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<NegotiationOutcome> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => return Some(outcome),
                Err(e) if e.is_cancelled() => continue,
                Err(e) => error!("Negotiation task panicked: {}", e),
            }
        }
        None
    }

    pub fn handle_peer_event(&mut self, event: PeerEvent, store: &mut SessionStore) {
        match event {
            PeerEvent::NewPeer { id } => self.on_new_peer(id, store),
            PeerEvent::OfferReceived { from, offer } => self.on_offer(from, offer, store),
            PeerEvent::AnswerReceived { from, answer } => self.on_answer(from, answer),
            PeerEvent::CandidateReceived { from, candidate } => self.on_candidate(from, candidate),
            PeerEvent::PeerLeft { id } => self.on_peer_left(id, store),
        }
    }

    fn on_new_peer(&mut self, id: PeerId, store: &mut SessionStore) {
        if id == self.local_id {
            return;
        }
        let Some(media) = store.local_media() else {
            info!("Peer {} joined; no local media, not offering", id);
            return;
        };
        let track_ids = media.tracks().iter().map(|t| t.id().to_owned()).collect();

        let key = self.open(id, PeerState::Offering, track_ids, store);
        info!("Offering to {}", key);
        self.spawn_connect(key);
    }

    fn on_offer(&mut self, from: PeerId, offer: SessionDescription, store: &mut SessionStore) {
        let track_ids = store
            .local_media()
            .map(|media| media.tracks().iter().map(|t| t.id().to_owned()).collect())
            .unwrap_or_default();

        let key = self.open(from, PeerState::Answering, track_ids, store);
        if let Some(conn) = self.registry.current_mut(&key) {
            conn.pending_offer = Some(offer);
        }
        info!("Answering offer from {}", key);
        self.spawn_connect(key);
    }

    fn spawn_connect(&mut self, key: ConnectionKey) {
        self.tasks.spawn(negotiation::connect(
            self.factory.clone(),
            key,
            self.transport_tx.clone(),
        ));
    }

    fn on_answer(&mut self, from: PeerId, answer: SessionDescription) {
        let Some(conn) = self.registry.get(&from) else {
            debug!("Answer from unknown peer {}", from);
            return;
        };
        let accepting = conn.local_sent
            && matches!(conn.state, PeerState::Offering | PeerState::Negotiating);
        let Some(transport) = conn.transport.clone().filter(|_| accepting) else {
            debug!("Dropping answer from {} in state {:?}", from, conn.state);
            return;
        };
        self.tasks.spawn(negotiation::apply_answer(
            conn.key.clone(),
            transport,
            answer,
        ));
    }

    fn on_candidate(&mut self, from: PeerId, candidate: IceCandidate) {
        let Some(conn) = self.registry.get_mut(&from) else {
            debug!("Candidate from unknown peer {}", from);
            return;
        };
        if conn.state.is_terminal() {
            return;
        }
        match (&conn.transport, conn.remote_applied) {
            (Some(transport), true) => {
                self.tasks.spawn(negotiation::add_candidate(
                    conn.key.clone(),
                    transport.clone(),
                    candidate,
                ));
            }
            _ => match self.policy {
                CandidatePolicy::Buffer => {
                    debug!("Buffering early candidate for {}", conn.key);
                    conn.pending_remote.push(candidate);
                }
                CandidatePolicy::Drop => {
                    debug!("Dropping early candidate for {}", conn.key);
                }
            },
        }
    }

    fn on_peer_left(&mut self, id: PeerId, store: &mut SessionStore) {
        if let Some(mut conn) = self.registry.remove(&id) {
            conn.state = PeerState::Closed;
            info!("Peer {} left", conn.key);
            release(conn);
        }
        store.remove_participant(&id);
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent, store: &mut SessionStore) {
        let Some(conn) = self.registry.current_mut(event.key()) else {
            debug!("Discarding transport event for stale {}", event.key());
            return;
        };

        match event {
            TransportEvent::CandidateGenerated(key, candidate) => {
                if conn.local_sent {
                    self.signaling.send_signal(SignalMessage::Candidate {
                        candidate,
                        from: self.local_id.clone(),
                        to: Some(key.peer_id),
                    });
                } else {
                    conn.pending_local.push(candidate);
                }
            }
            TransportEvent::TrackAttached(key, stream) => {
                if conn.inbound.is_none() {
                    debug!("Inbound {} stream attached for {}", stream.kind, key);
                    conn.inbound = Some(stream);
                }
                try_promote(conn, store);
            }
            TransportEvent::StateChanged(_, LinkState::Connected) => {
                conn.ice_connected = true;
                try_promote(conn, store);
            }
            TransportEvent::StateChanged(key, LinkState::Failed | LinkState::Disconnected) => {
                warn!("Connection to {} degraded, dropping it", key);
                self.discard(&key, PeerState::Failed, store);
            }
            TransportEvent::StateChanged(key, LinkState::Closed) => {
                debug!("Transport for {} closed", key);
                self.discard(&key, PeerState::Closed, store);
            }
            TransportEvent::StateChanged(_, LinkState::Connecting) => {}
        }
    }

    pub fn handle_outcome(&mut self, outcome: NegotiationOutcome, store: &mut SessionStore) {
        if !self.registry.is_current(outcome.key()) {
            debug!("Discarding outcome for replaced {}", outcome.key());
            if let NegotiationOutcome::Connected { key, transport } = outcome {
                negotiation::close_detached(key, transport);
            }
            return;
        }

        match outcome {
            NegotiationOutcome::Connected { key, transport } => {
                self.on_connected(key, transport, store)
            }
            NegotiationOutcome::LocalReady { key, description } => {
                self.on_local_ready(key, description, store)
            }
            NegotiationOutcome::RemoteApplied { key } => {
                let Some(conn) = self.registry.current_mut(&key) else {
                    return;
                };
                conn.remote_applied = true;
                conn.state = PeerState::Negotiating;
                debug!("Answer applied for {}", key);
                replay_remote(conn, &mut self.tasks);
                try_promote(conn, store);
            }
            NegotiationOutcome::CandidateAdded { key } => {
                debug!("Remote candidate added for {}", key);
            }
            NegotiationOutcome::Failed { key, step, error } => {
                warn!("Negotiation with {} failed at {}: {:#}", key, step, error);
                if step.is_fatal() {
                    self.discard(&key, PeerState::Failed, store);
                }
            }
        }
    }

    /// Records the new transport, then runs the offer or answer on it.
    fn on_connected(
        &mut self,
        key: ConnectionKey,
        transport: Arc<dyn PeerTransport>,
        store: &SessionStore,
    ) {
        let Some(conn) = self.registry.current_mut(&key) else {
            negotiation::close_detached(key, transport);
            return;
        };
        conn.transport = Some(transport.clone());

        let tracks = store
            .local_media()
            .map(|media| media.tracks().to_vec())
            .unwrap_or_default();
        match (conn.state, conn.pending_offer.take()) {
            (PeerState::Offering, _) => {
                self.tasks.spawn(negotiation::offer(key, transport, tracks));
            }
            (PeerState::Answering, Some(remote)) => {
                self.tasks
                    .spawn(negotiation::answer(key, transport, tracks, remote));
            }
            (state, _) => warn!("Transport ready for {} in state {:?}", key, state),
        }
    }

    fn on_local_ready(
        &mut self,
        key: ConnectionKey,
        description: SessionDescription,
        store: &mut SessionStore,
    ) {
        let Some(conn) = self.registry.current_mut(&key) else {
            return;
        };

        let from = self.local_id.clone();
        let to = Some(key.peer_id.clone());
        let msg = match conn.state {
            PeerState::Offering => SignalMessage::Offer {
                offer: description,
                from,
                to,
            },
            PeerState::Answering => {
                conn.remote_applied = true;
                conn.state = PeerState::Negotiating;
                SignalMessage::Answer {
                    answer: description,
                    from,
                    to,
                }
            }
            other => {
                warn!("Local description ready for {} in state {:?}", key, other);
                return;
            }
        };
        self.signaling.send_signal(msg);
        conn.local_sent = true;

        for candidate in conn.pending_local.drain(..) {
            self.signaling.send_signal(SignalMessage::Candidate {
                candidate,
                from: self.local_id.clone(),
                to: Some(key.peer_id.clone()),
            });
        }
        if conn.remote_applied {
            replay_remote(conn, &mut self.tasks);
        }
        try_promote(conn, store);
    }

    /// Registers a new connection, dropping whatever it replaces.
    fn open(
        &mut self,
        peer_id: PeerId,
        state: PeerState,
        track_ids: Vec<String>,
        store: &mut SessionStore,
    ) -> ConnectionKey {
        let (key, replaced) = self.registry.open(peer_id, state, track_ids);
        if let Some(mut old) = replaced {
            info!("Replacing connection {} with {}", old.key, key);
            old.state = PeerState::Closed;
            store.remove_participant(&key.peer_id);
            release(old);
        }
        key
    }

    fn discard(&mut self, key: &ConnectionKey, state: PeerState, store: &mut SessionStore) {
        let Some(mut conn) = self.registry.remove_current(key) else {
            return;
        };
        conn.state = state;
        store.remove_participant(&key.peer_id);
        release(conn);
    }

    /// Aborts in-flight steps, closes every transport and empties the roster.
    pub async fn shutdown(&mut self, store: &mut SessionStore) {
        self.tasks.abort_all();
        let mut transports = Vec::new();
        while let Some(joined) = self.tasks.join_next().await {
            // Transports created but not yet handed to the registry.
            if let Ok(NegotiationOutcome::Connected { key, transport }) = joined {
                transports.push((key, transport));
            }
        }

        for mut conn in self.registry.drain() {
            conn.state = PeerState::Closed;
            if let Some(transport) = conn.transport.take() {
                transports.push((conn.key, transport));
            }
        }
        store.clear_participants();

        info!("Closing {} peer transports", transports.len());
        negotiation::close_all(transports).await;
    }
}

fn try_promote(conn: &mut PeerConnection, store: &mut SessionStore) {
    if !conn.ready_to_connect() {
        return;
    }
    let Some(stream) = conn.inbound.clone() else {
        return;
    };
    conn.state = PeerState::Connected;
    let participant = Participant {
        id: conn.key.peer_id.clone(),
        stream,
    };
    if store.add_participant(participant) {
        info!("Connected to {}", conn.key);
    } else {
        warn!("Participant {} already in roster", conn.key.peer_id);
    }
}

fn replay_remote(conn: &mut PeerConnection, tasks: &mut JoinSet<NegotiationOutcome>) {
    let Some(transport) = conn.transport.clone() else {
        return;
    };
    for candidate in conn.pending_remote.drain(..) {
        tasks.spawn(negotiation::add_candidate(
            conn.key.clone(),
            transport.clone(),
            candidate,
        ));
    }
}

fn release(mut conn: PeerConnection) {
    if let Some(transport) = conn.transport.take() {
        negotiation::close_detached(conn.key, transport);
    }
}
