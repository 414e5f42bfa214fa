// Public API
pub use catalog::Blueprint;
pub use closure::{AffectedStats, StatClosure};
pub use definitions::{percentage, GameStat, Line, PlayerStat, StatValue, TeamStat};
pub use errors::StatlineError;
pub use models::{Side, StatMap, StatlineSnapshot, TeamSnapshot, TeamsSnapshot};
pub use primitive::{Primitive, PrimitiveStatline, PrimitiveValues};
pub use statline::GameStatline;

// Internal modules
pub mod catalog;
mod closure;
mod definitions;
mod errors;
mod models;
mod primitive;
mod statline;
