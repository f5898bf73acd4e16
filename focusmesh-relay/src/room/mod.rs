mod room_directory;
mod room_manager;
mod room_state;

pub use room_directory::*;
pub use room_manager::*;
pub use room_state::*;
