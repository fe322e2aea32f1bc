//! Construction-time configuration errors.

use thiserror::Error;

/// Errors raised while translating a declarative config into an
/// automaton.
///
/// Loading is eager and fails fast: any of these aborts construction
/// before a partially wired automaton can escape.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse automaton config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("i/o error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config contains no states")]
    NoStates,

    #[error("duplicate state name: {0}")]
    DuplicateState(String),

    #[error("unknown initial state: {0}")]
    UnknownInitialState(String),

    #[error("unknown state `{target}` referenced by {command} in algorithm `{algorithm}`")]
    UnknownState {
        target: String,
        command: &'static str,
        algorithm: String,
    },

    #[error("missing `{field}` for {command} in algorithm `{algorithm}`")]
    MissingField {
        field: &'static str,
        command: &'static str,
        algorithm: String,
    },

    #[error("invalid transition index `{0}` (expected \"first\", \"last\" or a number)")]
    InvalidIndex(String),

    #[error("invalid distribution parameters: {0}")]
    Distribution(String),
}
