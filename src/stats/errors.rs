use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatlineError {
    #[error("Stat '{0}' has two conflicting definitions in this blueprint")]
    ConflictingDefinition(&'static str),

    #[error("Player '{0}' is listed more than once")]
    DuplicatePlayer(String),

    #[error("Unknown blueprint: {0}")]
    UnknownBlueprint(String),
}
