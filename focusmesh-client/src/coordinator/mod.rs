mod coordinator;
mod negotiation;
mod peer_state;
mod registry;

pub use coordinator::*;
pub use negotiation::{NegotiationOutcome, NegotiationStep};
pub use peer_state::*;
pub use registry::*;
