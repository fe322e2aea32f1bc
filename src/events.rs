//! Structured diagnostic events emitted by the engine.
//!
//! The engine never writes to a global output stream. Every observable
//! side condition - transitions, fallbacks, missing algorithms - is
//! reported as an [`EngineEvent`] to an injectable [`EventSink`], so
//! tests can assert on diagnostics without capturing process output.
//! The default sink forwards events to `tracing`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, warn};

/// A single diagnostic event.
///
/// Events carry state *names* rather than handles so they remain
/// meaningful after the emitting automaton is gone (e.g. in shipped
/// logs).
#[derive(Clone, Debug, Serialize)]
pub enum EngineEvent {
    /// The context moved to a different state.
    Transition {
        from: String,
        to: String,
        at: DateTime<Utc>,
    },

    /// An algorithm was found and is about to execute.
    AlgorithmStarted { state: String, algorithm: String },

    /// An algorithm name was requested that the state does not carry.
    /// The request is a no-op; this event is the observable trace of it.
    AlgorithmMissing { state: String, algorithm: String },

    /// A transition command ran on a state with no registered
    /// successors; the context stayed in place.
    NoCandidates { state: String },

    /// All candidate weights were non-positive; selection fell back to
    /// the uniform distribution over the candidates.
    UniformFallback { state: String, candidates: usize },

    /// A deterministic transition index was out of range; the context
    /// stayed in place.
    IndexOutOfRange {
        state: String,
        index: usize,
        len: usize,
    },
}

/// Receiver for engine diagnostics.
///
/// Sinks must be cheap and infallible; the engine emits on the hot
/// path of every transition.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Default sink: forwards every event to `tracing`.
///
/// Fallback conditions are logged at `warn`, ordinary progress at
/// `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::Transition { from, to, .. } => {
                debug!(from = %from, to = %to, "transition");
            }
            EngineEvent::AlgorithmStarted { state, algorithm } => {
                debug!(state = %state, algorithm = %algorithm, "algorithm_start");
            }
            EngineEvent::AlgorithmMissing { state, algorithm } => {
                warn!(state = %state, algorithm = %algorithm, "algorithm_missing");
            }
            EngineEvent::NoCandidates { state } => {
                debug!(state = %state, "no_candidates");
            }
            EngineEvent::UniformFallback { state, candidates } => {
                warn!(state = %state, candidates, "uniform_fallback");
            }
            EngineEvent::IndexOutOfRange { state, index, len } => {
                warn!(state = %state, index, len, "index_out_of_range");
            }
        }
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: EngineEvent) {}
}

/// Sink that records events in memory, for tests and offline analysis.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().expect("sink poisoned").clone()
    }

    /// Drain the recorded events, leaving the sink empty.
    pub fn take(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.lock().expect("sink poisoned"))
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().expect("sink poisoned").push(event);
    }
}
