// Public API
pub use duration::{parse_offset, ClockTime};
pub use errors::ClockError;
pub use events::{ClockAction, ClockControl, ClockEvent, ClockEventKind};
pub use game_clock::{ClockSettings, ClockState, ClockStatus, ClockStatusView, GameClock};

// Internal modules
mod duration;
mod errors;
mod events;
mod game_clock;
