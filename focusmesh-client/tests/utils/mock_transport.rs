use anyhow::{Result, bail};
use async_trait::async_trait;
use focusmesh_client::{
    ConnectionKey, LinkState, LocalTrack, PeerTransport, RemoteStream, TrackKind,
    TransportEvent, TransportFactory,
};
use focusmesh_core::{IceCandidate, PeerId, SdpKind, SessionDescription};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{Notify, mpsc};

/// One primitive invocation recorded by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    AddTracks(Vec<String>),
    CreateOffer,
    CreateAnswer,
    SetLocal(SdpKind),
    SetRemote(SdpKind),
    AddCandidate(String),
    Close,
}

/// Knobs for making the mock misbehave.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Peers whose connect call fails.
    pub fail_connect_for: Vec<PeerId>,
    /// Fail `set_remote_description` for answers.
    pub reject_answers: bool,
    /// Local candidates emitted from inside `set_local_description`,
    /// i.e. before the offer/answer has gone out.
    pub candidates_on_local_description: usize,
    /// `create_offer` never completes.
    pub stall_offer: bool,
    /// Applying a remote answer waits for a permit on this gate.
    pub answer_gate: Option<Arc<Notify>>,
    /// Adding a remote candidate waits for a permit on this gate.
    pub candidate_gate: Option<Arc<Notify>>,
}

pub struct MockTransport {
    pub key: ConnectionKey,
    events: mpsc::Sender<TransportEvent>,
    calls: Mutex<Vec<TransportCall>>,
    closed: AtomicBool,
    behavior: MockBehavior,
}

impl MockTransport {
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has_call(&self, call: &TransportCall) -> bool {
        self.calls.lock().unwrap().contains(call)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Poll until `call` has been recorded.
    pub async fn wait_for_call(&self, call: &TransportCall, timeout_ms: u64) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if self.has_call(call) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    pub async fn wait_for_close(&self, timeout_ms: u64) -> bool {
        self.wait_for_call(&TransportCall::Close, timeout_ms).await
    }

    pub async fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event).await;
    }

    pub async fn ice_connected(&self) {
        self.emit(TransportEvent::StateChanged(
            self.key.clone(),
            LinkState::Connected,
        ))
        .await;
    }

    pub async fn degrade(&self, state: LinkState) {
        self.emit(TransportEvent::StateChanged(self.key.clone(), state))
            .await;
    }

    pub async fn attach_track(&self) {
        let stream = RemoteStream {
            stream_id: format!("{}-stream", self.key.peer_id),
            track_id: format!("{}-audio", self.key.peer_id),
            kind: TrackKind::Audio,
        };
        self.emit(TransportEvent::TrackAttached(self.key.clone(), stream))
            .await;
    }

    pub async fn local_candidate(&self, candidate: &str) {
        self.emit(TransportEvent::CandidateGenerated(
            self.key.clone(),
            candidate_named(candidate),
        ))
        .await;
    }

    fn record(&self, call: TransportCall) {
        tracing::debug!("[MockTransport {}] {:?}", self.key, call);
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn add_tracks(&self, tracks: &[LocalTrack]) -> Result<()> {
        self.record(TransportCall::AddTracks(
            tracks.iter().map(|t| t.id().to_owned()).collect(),
        ));
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(TransportCall::CreateOffer);
        if self.behavior.stall_offer {
            std::future::pending::<()>().await;
        }
        Ok(SessionDescription::offer(format!("offer-{}", self.key)))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record(TransportCall::CreateAnswer);
        Ok(SessionDescription::answer(format!("answer-{}", self.key)))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.record(TransportCall::SetLocal(description.kind));
        for n in 0..self.behavior.candidates_on_local_description {
            self.local_candidate(&format!("candidate:local-{n}")).await;
        }
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.record(TransportCall::SetRemote(description.kind));
        if description.kind == SdpKind::Answer {
            if let Some(gate) = &self.behavior.answer_gate {
                gate.notified().await;
            }
            if self.behavior.reject_answers {
                bail!("answer rejected");
            }
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(TransportCall::AddCandidate(candidate.candidate));
        if let Some(gate) = &self.behavior.candidate_gate {
            gate.notified().await;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.record(TransportCall::Close);
        Ok(())
    }
}

/// Factory handing out [`MockTransport`]s and remembering each of them.
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    behavior: MockBehavior,
    transports: Arc<Mutex<Vec<Arc<MockTransport>>>>,
}

impl MockTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            transports: Arc::default(),
        }
    }

    pub fn transports_for(&self, peer_id: &PeerId) -> Vec<Arc<MockTransport>> {
        self.transports
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.key.peer_id == peer_id)
            .cloned()
            .collect()
    }

    pub fn total(&self) -> usize {
        self.transports.lock().unwrap().len()
    }

    /// Wait for the `nth` (1-based) transport created for `peer_id`.
    pub async fn wait_for_transport(
        &self,
        peer_id: &PeerId,
        nth: usize,
        timeout_ms: u64,
    ) -> Option<Arc<MockTransport>> {
        let start = Instant::now();
        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if let Some(transport) = self.transports_for(peer_id).get(nth - 1) {
                return Some(transport.clone());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn connect(
        &self,
        key: ConnectionKey,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>> {
        if self.behavior.fail_connect_for.contains(&key.peer_id) {
            bail!("connect to {} refused", key);
        }
        let transport = Arc::new(MockTransport {
            key,
            events,
            calls: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            behavior: self.behavior.clone(),
        });
        self.transports.lock().unwrap().push(transport.clone());
        Ok(transport)
    }
}

pub fn candidate_named(candidate: &str) -> IceCandidate {
    IceCandidate {
        candidate: candidate.to_owned(),
        sdp_mid: Some("0".to_owned()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    }
}
