use crate::coordinator::PeerEvent;
use crate::signaling::SignalingOutput;
use focusmesh_core::{PeerId, SignalMessage, TimerActionKind, TimerPayload, TimerSnapshot};
use std::sync::Arc;
use tracing::{debug, warn};

/// A relay message that survived addressing, routed to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Peer(PeerEvent),
    Members(u32),
    Chat {
        text: String,
        sender: Option<String>,
        from: Option<PeerId>,
    },
    Timer {
        action: TimerActionKind,
        data: TimerPayload,
        from: Option<PeerId>,
    },
    TimerSync(TimerSnapshot),
}

/// Per-connection signaling state: the one-shot `join` guard and inbound
/// routing.
pub struct SignalingChannel {
    local_id: PeerId,
    announced: bool,
    output: Arc<dyn SignalingOutput>,
}

impl SignalingChannel {
    pub fn new(local_id: PeerId, output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            local_id,
            announced: false,
            output,
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn output(&self) -> &Arc<dyn SignalingOutput> {
        &self.output
    }

    pub fn is_joined(&self) -> bool {
        self.announced
    }

    /// Sends `join` unless it already went out on this connection.
    pub fn announce(&mut self) -> bool {
        if self.announced {
            return false;
        }
        self.announced = true;
        self.output.send_signal(SignalMessage::Join {
            id: self.local_id.clone(),
        });
        true
    }

    pub fn reset(&mut self) {
        self.announced = false;
    }

    pub fn decode(text: &str) -> Option<SignalMessage> {
        match serde_json::from_str(text) {
            Ok(msg) => Some(msg),
            Err(e) => {
                warn!("Dropping malformed relay message: {}", e);
                None
            }
        }
    }

    pub fn route(&self, msg: SignalMessage) -> Option<Inbound> {
        if !msg.is_addressed_to(&self.local_id) {
            debug!("Ignoring {} addressed to {:?}", msg.type_name(), msg.recipient());
            return None;
        }

        let me = &self.local_id;
        let inbound = match msg {
            SignalMessage::NewPeer { id } if &id != me => Inbound::Peer(PeerEvent::NewPeer { id }),
            SignalMessage::PeerLeft { id } if &id != me => {
                Inbound::Peer(PeerEvent::PeerLeft { id })
            }
            SignalMessage::Offer { offer, from, .. } if &from != me => {
                Inbound::Peer(PeerEvent::OfferReceived { from, offer })
            }
            // Answers only ever go to the peer that offered.
            SignalMessage::Answer {
                answer,
                from,
                to: Some(to),
            } if &from != me && &to == me => {
                Inbound::Peer(PeerEvent::AnswerReceived { from, answer })
            }
            SignalMessage::Candidate {
                candidate, from, ..
            } if &from != me => Inbound::Peer(PeerEvent::CandidateReceived { from, candidate }),
            SignalMessage::Members { count } => Inbound::Members(count),
            SignalMessage::Chat { text, sender, from } => Inbound::Chat { text, sender, from },
            SignalMessage::Timer { action, data, from } => Inbound::Timer { action, data, from },
            SignalMessage::TimerSync { data } => Inbound::TimerSync(data),
            other => {
                debug!("Ignoring {} message", other.type_name());
                return None;
            }
        };
        Some(inbound)
    }
}
