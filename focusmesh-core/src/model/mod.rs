mod chat;
mod peer;
mod room;
mod signaling;
mod timer;

pub use chat::{ChatEntry, FocusKind, FocusLogEntry};
pub use peer::PeerId;
pub use room::RoomName;
pub use signaling::{
    IceCandidate, IceServerConfig, SdpKind, SessionDescription, SignalMessage, TimerActionKind,
    TimerPayload, TimerSnapshot,
};
pub use timer::{TimerAction, TimerState};
