mod dispatch;
mod relay_connection;
mod signaling_output;

pub use dispatch::*;
pub use relay_connection::*;
pub use signaling_output::*;
