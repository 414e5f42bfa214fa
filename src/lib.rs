// Library crate for the live scorekeeping server
// This file exposes the public API for integration tests

pub mod clock;
pub mod config;
pub mod hub;
pub mod shared;
pub mod stats;

// Re-export commonly used types for easier access in tests
pub use clock::{ClockControl, ClockEvent, ClockEventKind, ClockSettings, ClockTime, GameClock};
pub use config::{HubConfig, ServerConfig, SnapshotMode};
pub use hub::{Hub, HubError, HubRegistry, MembershipView};
pub use shared::{AppError, AppState};
pub use stats::{Blueprint, GameStatline, Primitive, StatlineSnapshot};
