use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Same shape as the browser's `RTCSessionDescriptionInit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Same shape as the browser's `RTCIceCandidateInit`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerActionKind {
    Start,
    Pause,
    Resume,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_left: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub is_running: bool,
    pub time_left: u32,
}

/// Everything that travels over the room relay. `type` selects the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    Join {
        id: PeerId,
    },
    NewPeer {
        id: PeerId,
    },
    Offer {
        offer: SessionDescription,
        from: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<PeerId>,
    },
    Answer {
        answer: SessionDescription,
        from: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<PeerId>,
    },
    Candidate {
        candidate: IceCandidate,
        from: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<PeerId>,
    },
    Members {
        count: u32,
    },
    Chat {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<PeerId>,
    },
    Timer {
        action: TimerActionKind,
        #[serde(default)]
        data: TimerPayload,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<PeerId>,
    },
    TimerSync {
        data: TimerSnapshot,
    },
    PeerLeft {
        id: PeerId,
    },
    #[serde(other)]
    Unknown,
}

impl SignalMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            SignalMessage::Join { .. } => "join",
            SignalMessage::NewPeer { .. } => "new-peer",
            SignalMessage::Offer { .. } => "offer",
            SignalMessage::Answer { .. } => "answer",
            SignalMessage::Candidate { .. } => "candidate",
            SignalMessage::Members { .. } => "members",
            SignalMessage::Chat { .. } => "chat",
            SignalMessage::Timer { .. } => "timer",
            SignalMessage::TimerSync { .. } => "timer-sync",
            SignalMessage::PeerLeft { .. } => "peer-left",
            SignalMessage::Unknown => "unknown",
        }
    }

    /// The explicit recipient, for the message kinds that carry one.
    pub fn recipient(&self) -> Option<&PeerId> {
        match self {
            SignalMessage::Offer { to, .. }
            | SignalMessage::Answer { to, .. }
            | SignalMessage::Candidate { to, .. } => to.as_ref(),
            _ => None,
        }
    }

    pub fn sender(&self) -> Option<&PeerId> {
        match self {
            SignalMessage::Offer { from, .. }
            | SignalMessage::Answer { from, .. }
            | SignalMessage::Candidate { from, .. } => Some(from),
            SignalMessage::Chat { from, .. } | SignalMessage::Timer { from, .. } => from.as_ref(),
            _ => None,
        }
    }

    /// `to` absent or equal to `me`.
    pub fn is_addressed_to(&self, me: &PeerId) -> bool {
        self.recipient().is_none_or(|to| to == me)
    }

    pub fn is_from(&self, me: &PeerId) -> bool {
        self.sender() == Some(me)
    }
}
