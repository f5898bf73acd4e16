//! Plain HTTP endpoints next to the signaling socket: the room directory and
//! per-room chat history.

mod chat;
mod error;
mod rooms;

pub use chat::*;
pub use error::*;
pub use rooms::*;
