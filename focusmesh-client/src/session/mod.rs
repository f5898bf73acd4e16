mod chat_relay;
mod session;
mod timer_sync;

pub use chat_relay::ChatRelay;
pub use session::*;
pub use timer_sync::TimerSynchronizer;
