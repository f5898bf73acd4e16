pub mod config;
pub mod coordinator;
mod error;
pub mod media;
pub mod session;
pub mod signaling;
pub mod store;
pub mod transport;

pub use config::{CandidatePolicy, ClientConfig};
pub use coordinator::{
    ConnectionRegistry, Coordinator, NegotiationOutcome, NegotiationStep, PeerConnection, PeerEvent,
    PeerState,
};
pub use error::{Result, SessionError};
pub use media::{
    LocalMedia, LocalTrack, MediaError, MediaSource, NoMedia, SyntheticMedia, TrackKind,
};
pub use session::{
    ChatRelay, Session, SessionCommand, SessionHandle, SessionParts, TimerSynchronizer,
};
pub use signaling::{
    Inbound, RelayConnection, RelayEvent, RelayLink, RelaySender, SignalingChannel, SignalingOutput,
};
pub use store::{Participant, SessionSnapshot, SessionStore};
pub use transport::{
    ConnectionKey, LinkState, PeerTransport, RemoteStream, TransportConfig, TransportEvent,
    TransportFactory, WebrtcTransportFactory,
};
