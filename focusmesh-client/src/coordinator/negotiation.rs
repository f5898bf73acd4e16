use crate::media::LocalTrack;
use crate::transport::{ConnectionKey, PeerTransport, TransportEvent, TransportFactory};
use focusmesh_core::{IceCandidate, SessionDescription};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    Connect,
    Offer,
    Answer,
    ApplyAnswer,
    Candidate,
}

impl NegotiationStep {
    /// Whether a failure at this step takes the whole connection down.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            NegotiationStep::Connect | NegotiationStep::Offer | NegotiationStep::Answer
        )
    }
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationStep::Connect => "connect",
            NegotiationStep::Offer => "offer",
            NegotiationStep::Answer => "answer",
            NegotiationStep::ApplyAnswer => "apply answer",
            NegotiationStep::Candidate => "add candidate",
        };
        f.write_str(name)
    }
}

/// Result of one suspended negotiation step, resumed in the session loop.
pub enum NegotiationOutcome {
    Connected {
        key: ConnectionKey,
        transport: Arc<dyn PeerTransport>,
    },
    LocalReady {
        key: ConnectionKey,
        description: SessionDescription,
    },
    RemoteApplied {
        key: ConnectionKey,
    },
    CandidateAdded {
        key: ConnectionKey,
    },
    Failed {
        key: ConnectionKey,
        step: NegotiationStep,
        error: anyhow::Error,
    },
}

impl NegotiationOutcome {
    pub fn key(&self) -> &ConnectionKey {
        match self {
            NegotiationOutcome::Connected { key, .. }
            | NegotiationOutcome::LocalReady { key, .. }
            | NegotiationOutcome::RemoteApplied { key }
            | NegotiationOutcome::CandidateAdded { key }
            | NegotiationOutcome::Failed { key, .. } => key,
        }
    }
}

impl fmt::Debug for NegotiationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationOutcome::Connected { key, .. } => write!(f, "Connected({})", key),
            NegotiationOutcome::LocalReady { key, description } => {
                write!(f, "LocalReady({}, {:?})", key, description.kind)
            }
            NegotiationOutcome::RemoteApplied { key } => write!(f, "RemoteApplied({})", key),
            NegotiationOutcome::CandidateAdded { key } => write!(f, "CandidateAdded({})", key),
            NegotiationOutcome::Failed { key, step, error } => {
                write!(f, "Failed({}, {}: {:#})", key, step, error)
            }
        }
    }
}

fn failed(key: ConnectionKey, step: NegotiationStep, error: anyhow::Error) -> NegotiationOutcome {
    NegotiationOutcome::Failed { key, step, error }
}

async fn close_quietly(key: &ConnectionKey, transport: &Arc<dyn PeerTransport>) {
    if let Err(e) = transport.close().await {
        warn!("Failed to close transport for {}: {:#}", key, e);
    }
}

/// Creates the transport. It is handed back before any other primitive
/// runs, so the registry owns it for the rest of the negotiation.
pub(crate) async fn connect(
    factory: Arc<dyn TransportFactory>,
    key: ConnectionKey,
    events: mpsc::Sender<TransportEvent>,
) -> NegotiationOutcome {
    match factory.connect(key.clone(), events).await {
        Ok(transport) => NegotiationOutcome::Connected { key, transport },
        Err(e) => failed(key, NegotiationStep::Connect, e),
    }
}

/// Attaches local tracks and produces a local offer.
pub(crate) async fn offer(
    key: ConnectionKey,
    transport: Arc<dyn PeerTransport>,
    tracks: Vec<LocalTrack>,
) -> NegotiationOutcome {
    let result = async {
        transport.add_tracks(&tracks).await?;
        let description = transport.create_offer().await?;
        transport.set_local_description(description.clone()).await?;
        anyhow::Ok(description)
    }
    .await;

    match result {
        Ok(description) => NegotiationOutcome::LocalReady { key, description },
        Err(e) => failed(key, NegotiationStep::Offer, e),
    }
}

/// Applies the remote offer and produces an answer.
pub(crate) async fn answer(
    key: ConnectionKey,
    transport: Arc<dyn PeerTransport>,
    tracks: Vec<LocalTrack>,
    remote: SessionDescription,
) -> NegotiationOutcome {
    let result = async {
        transport.add_tracks(&tracks).await?;
        transport.set_remote_description(remote).await?;
        let description = transport.create_answer().await?;
        transport.set_local_description(description.clone()).await?;
        anyhow::Ok(description)
    }
    .await;

    match result {
        Ok(description) => NegotiationOutcome::LocalReady { key, description },
        Err(e) => failed(key, NegotiationStep::Answer, e),
    }
}

pub(crate) async fn apply_answer(
    key: ConnectionKey,
    transport: Arc<dyn PeerTransport>,
    remote: SessionDescription,
) -> NegotiationOutcome {
    match transport.set_remote_description(remote).await {
        Ok(()) => NegotiationOutcome::RemoteApplied { key },
        Err(e) => failed(key, NegotiationStep::ApplyAnswer, e),
    }
}

pub(crate) async fn add_candidate(
    key: ConnectionKey,
    transport: Arc<dyn PeerTransport>,
    candidate: IceCandidate,
) -> NegotiationOutcome {
    match transport.add_ice_candidate(candidate).await {
        Ok(()) => NegotiationOutcome::CandidateAdded { key },
        Err(e) => failed(key, NegotiationStep::Candidate, e),
    }
}

/// Closes a transport outside the session loop.
pub(crate) fn close_detached(key: ConnectionKey, transport: Arc<dyn PeerTransport>) {
    tokio::spawn(async move {
        close_quietly(&key, &transport).await;
    });
}

pub(crate) async fn close_all(transports: Vec<(ConnectionKey, Arc<dyn PeerTransport>)>) {
    futures::future::join_all(
        transports
            .iter()
            .map(|(key, transport)| close_quietly(key, transport)),
    )
    .await;
}
