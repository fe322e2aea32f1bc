//! Runtime error types for the execution engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, ExecError>;

/// Fatal contract violations raised while executing an algorithm.
///
/// These abort the current `run`/`step` call. Degenerate-but-valid
/// conditions (all weights non-positive, a missing algorithm, an
/// out-of-range transition index) are *not* errors: the engine falls
/// back to a well-defined default and reports the fallback through the
/// [`EventSink`](crate::events::EventSink).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// A history policy returned a weight vector whose length does not
    /// match the candidate list. This is a programming error in the
    /// policy, not a runtime condition to recover from.
    #[error("history policy returned {actual} weights for {expected} candidates")]
    PolicyContract { expected: usize, actual: usize },

    /// A state handle did not originate from the automaton's own graph.
    #[error("state handle {index} does not belong to this graph")]
    ForeignState { index: usize },
}
