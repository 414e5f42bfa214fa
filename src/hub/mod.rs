// Public API
pub use errors::HubError;
pub use events::{ClockCommand, GameEvent, StatAction, StatEvent};
pub use game_hub::{Hub, HubSummary, MembershipView};
pub use handlers::{end_game, keep_game, start_game, watch_game};
pub use models::{GameRecord, GameType, LiveGame, UserId};
pub use registry::HubRegistry;
pub use repository::{GameRepository, InMemoryGameRepository, PostgresGameRepository};
pub use socket::{Frame, FrameSink, FrameStream, TransportError};

// Internal modules
mod errors;
mod events;
mod game_hub;
mod handlers;
mod keeper;
mod models;
mod registry;
mod repository;
mod socket;
mod watcher;
